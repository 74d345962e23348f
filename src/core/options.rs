//! Run configuration for the infrastructure binary.
//!
//! [`Options`] names a working directory and everything passed alongside
//! it: input variables, var files, target restrictions, process environment
//! and retry behaviour. The same value is handed to every operation of a
//! test, so `init`, `plan` and `destroy` all see identical arguments.
//!
//! ```rust
//! use infratest::Options;
//!
//! let options = Options::builder("opentofu/examples/basic")
//!     .var("environment", "test")
//!     .target("module.event_queue")
//!     .build()
//!     .with_default_retryable_errors();
//!
//! assert_eq!(options.targets(), &["module.event_queue"]);
//! ```

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::environment::Environment;
use super::retry::RetryPolicy;
use super::vars::Vars;

/// Binary used when none is configured.
pub const DEFAULT_BINARY: &str = "terraform";

/// Configuration for one run against a directory of definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    working_dir: PathBuf,
    binary: String,
    vars: Vars,
    var_files: Vec<PathBuf>,
    targets: Vec<String>,
    env: Environment,
    backend_config: BTreeMap<String, String>,
    backend: bool,
    upgrade: bool,
    reconfigure: bool,
    no_color: bool,
    lock: bool,
    lock_timeout: Option<String>,
    parallelism: Option<u32>,
    plan_file: Option<PathBuf>,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl Options {
    /// Create a new builder for the given working directory.
    pub fn builder(working_dir: impl Into<PathBuf>) -> OptionsBuilder {
        OptionsBuilder::new(working_dir)
    }

    /// Install the default retry policy for known transient failures.
    pub fn with_default_retryable_errors(mut self) -> Self {
        let mut policy = RetryPolicy::default_retryable();
        for (fragment, reason) in &self.retry.retryable_errors {
            policy.retryable_errors.insert(fragment.clone(), reason.clone());
        }
        self.retry = policy;
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn var_files(&self) -> &[PathBuf] {
        &self.var_files
    }

    /// Target restriction; empty means unrestricted.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn backend_config(&self) -> &BTreeMap<String, String> {
        &self.backend_config
    }

    pub fn backend(&self) -> bool {
        self.backend
    }

    pub fn upgrade(&self) -> bool {
        self.upgrade
    }

    pub fn reconfigure(&self) -> bool {
        self.reconfigure
    }

    pub fn no_color(&self) -> bool {
        self.no_color
    }

    pub fn lock(&self) -> bool {
        self.lock
    }

    pub fn lock_timeout(&self) -> Option<&str> {
        self.lock_timeout.as_deref()
    }

    pub fn parallelism(&self) -> Option<u32> {
        self.parallelism
    }

    pub fn plan_file(&self) -> Option<&Path> {
        self.plan_file.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

/// Builder for creating [`Options`].
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    inner: Options,
}

impl OptionsBuilder {
    /// Create a new builder with the given working directory.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Options {
                working_dir: working_dir.into(),
                binary: DEFAULT_BINARY.to_string(),
                vars: Vars::default(),
                var_files: Vec::new(),
                targets: Vec::new(),
                env: Environment::default(),
                backend_config: BTreeMap::new(),
                backend: true,
                upgrade: false,
                reconfigure: false,
                no_color: true,
                lock: false,
                lock_timeout: None,
                parallelism: None,
                plan_file: None,
                timeout: None,
                retry: RetryPolicy::default(),
            },
        }
    }

    /// Set the binary, e.g. `tofu` or an absolute path.
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.inner.binary = binary.into();
        self
    }

    /// Add an input variable.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.vars.set(name, value);
        self
    }

    /// Replace all input variables.
    pub fn vars(mut self, vars: Vars) -> Self {
        self.inner.vars = vars;
        self
    }

    /// Add a var file.
    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.var_files.push(path.into());
        self
    }

    /// Restrict operations to a resource or module address.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.inner.targets.push(target.into());
        self
    }

    /// Restrict operations to several addresses.
    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.targets.extend(targets.into_iter().map(Into::into));
        self
    }

    /// Add a process environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.env.set(key, value);
        self
    }

    /// Replace the process environment.
    pub fn environment(mut self, env: Environment) -> Self {
        self.inner.env = env;
        self
    }

    /// Add a `-backend-config` entry for init.
    pub fn backend_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.backend_config.insert(key.into(), value.into());
        self
    }

    /// Whether init configures the backend.
    pub fn backend(mut self, enabled: bool) -> Self {
        self.inner.backend = enabled;
        self
    }

    pub fn upgrade(mut self, upgrade: bool) -> Self {
        self.inner.upgrade = upgrade;
        self
    }

    pub fn reconfigure(mut self, reconfigure: bool) -> Self {
        self.inner.reconfigure = reconfigure;
        self
    }

    pub fn no_color(mut self, no_color: bool) -> Self {
        self.inner.no_color = no_color;
        self
    }

    /// Whether to hold the state lock.
    pub fn lock(mut self, lock: bool) -> Self {
        self.inner.lock = lock;
        self
    }

    /// Lock timeout in the binary's duration syntax, e.g. `60s`.
    pub fn lock_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.inner.lock_timeout = Some(timeout.into());
        self
    }

    pub fn parallelism(mut self, n: u32) -> Self {
        self.inner.parallelism = Some(n);
        self
    }

    /// Write the plan to this file; apply will then consume it.
    pub fn plan_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.plan_file = Some(path.into());
        self
    }

    /// Kill any single command running longer than this.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.inner.timeout = Some(duration);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.inner.retry = policy;
        self
    }

    /// Build the [`Options`].
    pub fn build(self) -> Options {
        self.inner
    }
}
