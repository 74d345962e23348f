//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use infratest::{Options, OptionsBuilder};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Plan text printed by the fake binary unless overridden.
pub const PLAN_OUTPUT: &str = "Plan: 2 to add, 0 to change, 0 to destroy.";

/// A scripted stand-in for the infrastructure binary.
///
/// Every invocation appends its arguments as one line to a log file, so
/// tests can check which subcommands ran, in which order, with which flags.
pub struct FakeTerraform {
    dir: TempDir,
    binary: PathBuf,
    log: PathBuf,
}

pub struct FakeTerraformBuilder {
    plan_output: String,
    fail_on: Option<(String, i32, String)>,
    flaky: Option<(String, u32, String)>,
}

impl FakeTerraform {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> FakeTerraformBuilder {
        FakeTerraformBuilder {
            plan_output: PLAN_OUTPUT.to_string(),
            fail_on: None,
            flaky: None,
        }
    }

    /// Directory standing in for the example definitions.
    pub fn working_dir(&self) -> PathBuf {
        self.dir.path().join("basic")
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Options for the basic example with `environment = "test"`.
    pub fn options(&self) -> OptionsBuilder {
        Options::builder(self.working_dir())
            .binary(self.binary.display().to_string())
            .var("environment", "test")
    }

    /// Full argument lines, one per invocation.
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    /// Subcommand of each invocation.
    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|l| l.split_whitespace().next().unwrap_or("").to_string())
            .collect()
    }

    pub fn count(&self, subcommand: &str) -> usize {
        self.subcommands().iter().filter(|s| *s == subcommand).count()
    }
}

impl FakeTerraformBuilder {
    /// What `plan` prints; empty means no output at all.
    pub fn plan_output(mut self, output: &str) -> Self {
        self.plan_output = output.to_string();
        self
    }

    /// Make `subcommand` always fail with `code` and `message` on stderr.
    pub fn fail_on(mut self, subcommand: &str, code: i32, message: &str) -> Self {
        self.fail_on = Some((subcommand.to_string(), code, message.to_string()));
        self
    }

    /// Make the first `failures` calls of `subcommand` fail with `message`.
    pub fn flaky(mut self, subcommand: &str, failures: u32, message: &str) -> Self {
        self.flaky = Some((subcommand.to_string(), failures, message.to_string()));
        self
    }

    pub fn build(self) -> FakeTerraform {
        let dir = TempDir::new().expect("create temp dir");
        std::fs::create_dir(dir.path().join("basic")).expect("create working dir");
        let binary = dir.path().join("terraform");
        let log = dir.path().join("calls.log");

        let mut script = String::from("#!/bin/sh\n");
        script.push_str(&format!("echo \"$*\" >> '{}'\n", log.display()));

        if let Some((sub, failures, message)) = &self.flaky {
            let counter = dir.path().join(format!("{}.count", sub));
            script.push_str(&format!(
                "if [ \"$1\" = '{sub}' ]; then\n  \
                 n=$(cat '{c}' 2>/dev/null || echo 0); n=$((n+1)); echo $n > '{c}'\n  \
                 if [ $n -le {failures} ]; then echo '{message}' >&2; exit 1; fi\n\
                 fi\n",
                c = counter.display(),
            ));
        }
        if let Some((sub, code, message)) = &self.fail_on {
            script.push_str(&format!(
                "if [ \"$1\" = '{sub}' ]; then echo '{message}' >&2; exit {code}; fi\n"
            ));
        }

        let plan = if self.plan_output.is_empty() {
            ":".to_string()
        } else {
            format!("echo '{}'", self.plan_output)
        };
        script.push_str(&format!(
            "case \"$1\" in\n  \
             init) echo 'Terraform has been successfully initialized!' ;;\n  \
             plan) {plan} ;;\n  \
             destroy) echo 'Destroy complete! Resources: 0 destroyed.' ;;\n  \
             *) ;;\n\
             esac\n"
        ));

        std::fs::write(&binary, script).expect("write fake binary");
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            .expect("make fake binary executable");

        FakeTerraform { dir, binary, log }
    }
}
