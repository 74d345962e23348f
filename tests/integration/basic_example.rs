//! Plans of the basic example with the real binary.
//!
//! These need `terraform` (or the binary named by `INFRATEST_BINARY`), the
//! example definitions and provider credentials, so they are ignored by
//! default. Run them with `cargo test -- --ignored`.

use infratest::{DestroyGuard, Options, is_empty_plan, terraform};
use std::path::PathBuf;

fn example_dir() -> PathBuf {
    std::env::var_os("INFRATEST_EXAMPLE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("opentofu/examples/basic"))
}

fn basic_options(target: Option<&str>) -> Options {
    let binary = std::env::var("INFRATEST_BINARY").unwrap_or_else(|_| "terraform".to_string());
    let mut builder = Options::builder(example_dir())
        .binary(binary)
        .var("environment", "test");
    if let Some(target) = target {
        builder = builder.target(target);
    }
    builder.build().with_default_retryable_errors()
}

async fn plan_and_tear_down(options: Options) {
    let _teardown = DestroyGuard::new(&options);

    terraform::init_and_plan(&options)
        .await
        .expect("init and plan should succeed");

    let output = terraform::plan(&options).await.expect("plan should succeed");
    assert!(!is_empty_plan(&output), "plan output should not be empty");
}

#[tokio::test]
#[ignore = "requires the terraform binary, example definitions and credentials"]
async fn test_basic_example() {
    plan_and_tear_down(basic_options(None)).await;
}

#[tokio::test]
#[ignore = "requires the terraform binary, example definitions and credentials"]
async fn test_sqs_module() {
    plan_and_tear_down(basic_options(Some("module.event_queue"))).await;
}

#[tokio::test]
#[ignore = "requires the terraform binary, example definitions and credentials"]
async fn test_lambda_module() {
    plan_and_tear_down(basic_options(Some("module.event_processor"))).await;
}
