//! The `infratest` binary against a scripted fake.

use serde_json::Value;
use std::process::Command;

use crate::common::{FakeTerraform, PLAN_OUTPUT};

fn infratest() -> Command {
    Command::new(env!("CARGO_BIN_EXE_infratest"))
}

#[test]
fn test_run_json_prints_only_the_report_on_stdout() {
    let fake = FakeTerraform::new();
    let suite = fake.root().join("suite.yaml");
    std::fs::write(
        &suite,
        format!(
            "binary: {}\nvars: {{ environment: test }}\ncases:\n  - name: sqs_module\n    dir: basic\n    targets: [module.event_queue]\n",
            fake.binary().display()
        ),
    )
    .unwrap();

    let output = infratest()
        .arg("run")
        .arg(&suite)
        .arg("--json")
        .env("RUST_LOG", "info")
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["cases"][0]["name"], "sqs_module");
    assert_eq!(report["cases"][0]["outcome"]["status"], "passed");
    assert_eq!(report["cases"][0]["destroyed"], true);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Loading suite"));
    assert_eq!(fake.count("destroy"), 1);
}

#[test]
fn test_run_exits_non_zero_on_empty_plan() {
    let fake = FakeTerraform::builder().plan_output("").build();
    let suite = fake.root().join("suite.yaml");
    std::fs::write(
        &suite,
        format!(
            "binary: {}\ncases:\n  - {{ name: basic, dir: basic }}\n",
            fake.binary().display()
        ),
    )
    .unwrap();

    let output = infratest().arg("run").arg(&suite).arg("--json").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["cases"][0]["outcome"]["status"], "assertion_failed");
    assert_eq!(fake.count("destroy"), 1);
}

#[test]
fn test_deploy_plan_prints_plan_text_only() {
    let fake = FakeTerraform::new();

    let output = infratest()
        .args(["deploy", "plan", "-d"])
        .arg(fake.working_dir())
        .arg("--binary")
        .arg(fake.binary())
        .args(["--var", "environment=test"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), PLAN_OUTPUT);
    assert_eq!(fake.subcommands(), vec!["init", "validate", "plan"]);
}
