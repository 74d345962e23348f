//! Suite files run end to end against a scripted binary.

use infratest::{CaseOutcome, SuiteRunner, load_cases};
use std::path::PathBuf;

use crate::common::FakeTerraform;

/// Write a suite with the three basic-example cases next to the fake.
fn write_suite(fake: &FakeTerraform, extra: &str) -> PathBuf {
    let path = fake.root().join("suite.yaml");
    let yaml = format!(
        r#"
binary: {binary}
vars:
  environment: test
{extra}
cases:
  - name: basic
    dir: basic
  - name: sqs_module
    dir: basic
    targets: [module.event_queue]
  - name: lambda_module
    dir: basic
    targets: [module.event_processor]
"#,
        binary = fake.binary().display(),
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

#[tokio::test]
async fn test_suite_runs_every_case_and_destroys_each() {
    let fake = FakeTerraform::new();
    let (_, cases) = load_cases(write_suite(&fake, "")).unwrap();

    let report = SuiteRunner::new().run(cases).await;

    assert!(report.success());
    assert_eq!(report.passed(), 3);
    let names: Vec<&str> = report.cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["basic", "sqs_module", "lambda_module"]);
    assert!(report.cases.iter().all(|c| c.destroyed && c.plan_bytes > 0));

    assert_eq!(fake.count("init"), 3);
    assert_eq!(fake.count("plan"), 6);
    assert_eq!(fake.count("destroy"), 3);
    let destroys: Vec<String> = fake
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("destroy"))
        .collect();
    assert!(destroys.iter().any(|c| c.contains("-target=module.event_queue")));
    assert!(destroys.iter().any(|c| c.contains("-target=module.event_processor")));
    assert!(destroys.iter().any(|c| !c.contains("-target=")));
}

#[tokio::test]
async fn test_concurrent_cases_keep_declaration_order() {
    let fake = FakeTerraform::new();
    let (suite, cases) = load_cases(write_suite(&fake, "max_concurrent_cases: 3")).unwrap();

    let runner = SuiteRunner::new().with_max_concurrent(suite.max_concurrent_cases.unwrap());
    let report = runner.run(cases).await;

    assert_eq!(report.passed(), 3);
    assert_eq!(report.cases[1].name, "sqs_module");
    assert_eq!(fake.count("destroy"), 3);
}

#[tokio::test]
async fn test_empty_plan_is_assertion_failure_and_still_destroys() {
    let fake = FakeTerraform::builder().plan_output("").build();
    let (_, cases) = load_cases(write_suite(&fake, "")).unwrap();

    let report = SuiteRunner::new().run(cases).await;

    assert_eq!(report.failed(), 3);
    for case in &report.cases {
        assert_eq!(
            case.outcome,
            CaseOutcome::AssertionFailed("plan output is empty".to_string())
        );
    }
    assert_eq!(fake.count("destroy"), 3);
}

#[tokio::test]
async fn test_init_failure_is_fatal_and_still_destroys() {
    let fake = FakeTerraform::builder()
        .fail_on("init", 1, "Error: Module not installed")
        .build();
    let (_, cases) = load_cases(write_suite(&fake, "")).unwrap();

    let report = SuiteRunner::new().run(cases).await;

    assert!(!report.success());
    for case in &report.cases {
        match &case.outcome {
            CaseOutcome::Fatal(msg) => assert!(msg.contains("Module not installed"), "{}", msg),
            other => panic!("Expected Fatal, got {:?}", other),
        }
    }
    assert_eq!(fake.count("plan"), 0);
    assert_eq!(fake.count("destroy"), 3);
}

#[tokio::test]
async fn test_failed_destroy_fails_the_case() {
    let fake = FakeTerraform::builder()
        .fail_on("destroy", 1, "Error: deleting queue: AccessDenied")
        .build();
    let (_, mut cases) = load_cases(write_suite(&fake, "")).unwrap();
    cases.truncate(1);

    let report = SuiteRunner::new().run(cases).await;

    let case = &report.cases[0];
    assert_eq!(case.outcome, CaseOutcome::Passed);
    assert!(case.destroy_error.as_deref().unwrap().contains("AccessDenied"));
    assert_eq!(report.failed(), 1);
    assert_eq!(report.passed(), 0);
}
