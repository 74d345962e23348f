//! Teardown, ordering and target restriction against a scripted binary.
//!
//! Each test runs the init-and-plan / plan / non-empty / destroy contract
//! and checks the recorded invocations.

use infratest::{
    DestroyGuard, RetryPolicy, TerraformError, is_empty_plan, terraform, with_teardown,
};
use std::time::Duration;

use crate::common::{FakeTerraform, PLAN_OUTPUT};

#[tokio::test]
async fn test_unrestricted_plan_then_destroy_last() {
    let fake = FakeTerraform::new();
    let options = fake.options().build();

    {
        let _teardown = DestroyGuard::new(&options);
        terraform::init_and_plan(&options).await.unwrap();
        let output = terraform::plan(&options).await.unwrap();
        assert_eq!(output.trim(), PLAN_OUTPUT);
    }

    assert_eq!(fake.subcommands(), vec!["init", "plan", "plan", "destroy"]);
    assert!(fake.calls().iter().all(|c| !c.contains("-target=")));
    assert!(fake.calls()[3].contains("environment=test"));
}

#[tokio::test]
async fn test_event_queue_target_is_respected() {
    let fake = FakeTerraform::new();
    let options = fake.options().target("module.event_queue").build();

    let output = with_teardown(&options, |opts| async move {
        terraform::init_and_plan(&opts).await?;
        terraform::plan(&opts).await
    })
    .await
    .unwrap();

    assert!(!is_empty_plan(&output));
    assert_eq!(fake.subcommands(), vec!["init", "plan", "plan", "destroy"]);
    for call in fake.calls().iter().filter(|c| !c.starts_with("init")) {
        assert!(call.contains("-target=module.event_queue"), "missing target: {}", call);
        assert_eq!(call.matches("-target=").count(), 1, "extra target: {}", call);
    }
}

#[tokio::test]
async fn test_event_processor_target_is_respected() {
    let fake = FakeTerraform::new();
    let options = fake.options().target("module.event_processor").build();

    {
        let _teardown = DestroyGuard::new(&options);
        terraform::init_and_plan(&options).await.unwrap();
        assert!(!is_empty_plan(&terraform::plan(&options).await.unwrap()));
    }

    let destroy = fake.calls().pop().unwrap();
    assert!(destroy.starts_with("destroy -auto-approve -input=false"));
    assert!(destroy.contains("-target=module.event_processor"));
    assert!(!destroy.contains("module.event_queue"));
}

#[tokio::test]
async fn test_destroy_runs_when_init_fails() {
    let fake = FakeTerraform::builder()
        .fail_on("init", 1, "Error: Failed to query available provider packages")
        .build();
    let options = fake.options().build();

    let result = with_teardown(&options, |opts| async move {
        terraform::init_and_plan(&opts).await?;
        terraform::plan(&opts).await
    })
    .await;

    assert!(matches!(result, Err(TerraformError::Command(_))));
    assert_eq!(fake.subcommands(), vec!["init", "destroy"]);
}

#[tokio::test]
async fn test_destroy_runs_once_when_assertion_panics() {
    let fake = FakeTerraform::builder().plan_output("").build();
    let options = fake.options().build();

    let handle = tokio::spawn(async move {
        let _teardown = DestroyGuard::new(&options);
        terraform::init_and_plan(&options).await.unwrap();
        let output = terraform::plan(&options).await.unwrap();
        assert!(!is_empty_plan(&output), "plan output should not be empty");
    });

    let err = handle.await.unwrap_err();
    assert!(err.is_panic());
    assert_eq!(fake.subcommands(), vec!["init", "plan", "plan", "destroy"]);
    assert_eq!(fake.count("destroy"), 1);
}

#[tokio::test]
async fn test_destroy_runs_on_early_return() {
    let fake = FakeTerraform::builder()
        .fail_on("plan", 1, "Error: Reference to undeclared module")
        .build();
    let options = fake.options().build();

    async fn body(options: &infratest::Options) -> Result<String, TerraformError> {
        let _teardown = DestroyGuard::new(options);
        terraform::init_and_plan(options).await?;
        terraform::plan(options).await
    }

    assert!(body(&options).await.is_err());
    assert_eq!(fake.subcommands(), vec!["init", "plan", "destroy"]);
}

#[tokio::test]
async fn test_transient_init_failure_is_retried() {
    let fake = FakeTerraform::builder()
        .flaky("init", 2, "Error: registry service is unreachable")
        .build();
    let options = fake
        .options()
        .build()
        .with_retry(RetryPolicy::fixed(3, Duration::from_millis(10)).with_default_errors());

    with_teardown(&options, |opts| async move {
        terraform::init_and_plan(&opts).await?;
        terraform::plan(&opts).await
    })
    .await
    .unwrap();

    assert_eq!(fake.count("init"), 3);
    assert_eq!(fake.count("destroy"), 1);
}

#[tokio::test]
async fn test_default_retryable_errors_do_not_retry_real_failures() {
    let fake = FakeTerraform::builder()
        .fail_on("init", 1, "Error: Unsupported block type")
        .build();
    let options = fake.options().build().with_default_retryable_errors();

    let err = terraform::init(&options).await.unwrap_err();

    assert!(err.to_string().contains("Unsupported block type"));
    assert_eq!(fake.count("init"), 1);
}
