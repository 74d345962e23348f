//! Suite file type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::vars::Vars;

/// A suite file: shared settings plus the cases to run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Binary to run (`terraform`, `tofu` or a path).
    pub binary: Option<String>,
    /// How many cases may run at the same time.
    pub max_concurrent_cases: Option<usize>,
    /// Per-command timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Environment variables for every case.
    pub environment: BTreeMap<String, String>,
    /// Variables for every case; case variables win.
    pub vars: Vars,
    /// Retry policy for every case.
    pub retry: Option<RetryConfig>,
    /// Cases in declaration order.
    pub cases: Vec<CaseConfig>,
}

/// One run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    /// Case name, unique within the suite.
    pub name: String,
    /// Working directory, relative to the suite file.
    pub dir: String,
    #[serde(default)]
    pub vars: Vars,
    #[serde(default)]
    pub var_files: Vec<String>,
    /// Target restriction; empty means unrestricted.
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub backend_config: BTreeMap<String, String>,
    /// Whether the case runs; disabled cases are listed but skipped.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_attempts: u32,
    /// Delay between attempts in seconds.
    #[serde(default)]
    pub delay_secs: u64,
    /// Include the built-in transient error list.
    #[serde(default = "default_true")]
    pub default_errors: bool,
    /// Extra output fragment → explanation pairs.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}
