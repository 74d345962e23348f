//! Options builder from suite configuration.
//!
//! Converts a case into a runnable [`Options`], layering suite-wide settings
//! under case settings and resolving paths against the suite file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::environment::Environment;
use crate::core::options::Options;
use crate::core::retry::RetryPolicy;

use super::error::ConfigError;
use super::types::{CaseConfig, RetryConfig, SuiteConfig};
use super::yaml::YamlLoader;

/// A case ready to run.
#[derive(Debug, Clone)]
pub struct PreparedCase {
    pub name: String,
    pub enabled: bool,
    pub options: Options,
}

/// Builder for creating [`Options`] from suite configuration.
pub struct CaseBuilder;

impl CaseBuilder {
    /// Build the options for one case. Relative paths are resolved against
    /// `base_dir`.
    pub fn build(suite: &SuiteConfig, case: &CaseConfig, base_dir: &Path) -> Options {
        let mut builder = Options::builder(resolve(base_dir, &case.dir));

        if let Some(binary) = &suite.binary {
            builder = builder.binary(resolve_binary(base_dir, binary));
        }

        let mut vars = suite.vars.clone();
        vars.merge(&case.vars);
        builder = builder.vars(vars);

        for file in &case.var_files {
            builder = builder.var_file(resolve(base_dir, file));
        }

        builder = builder.targets(case.targets.iter().cloned());

        // Case-level variables override suite-level ones.
        let suite_env: Environment = suite
            .environment
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let case_env: Environment = case
            .environment
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        builder = builder.environment(suite_env.merged_with(&case_env));

        for (key, value) in &case.backend_config {
            builder = builder.backend_config(key, value);
        }

        if let Some(secs) = suite.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        if let Some(retry) = &suite.retry {
            builder = builder.retry_policy(Self::build_retry_policy(retry));
        }

        builder.build()
    }

    /// Build a retry policy from configuration.
    pub fn build_retry_policy(config: &RetryConfig) -> RetryPolicy {
        let mut policy = RetryPolicy::fixed(config.max_attempts, Duration::from_secs(config.delay_secs));
        if config.default_errors {
            policy = policy.with_default_errors();
        }
        for (fragment, reason) in &config.errors {
            policy = policy.with_error(fragment, reason);
        }
        policy
    }
}

/// Load a suite file and prepare every case, in declaration order.
pub fn load_cases(path: impl AsRef<Path>) -> Result<(SuiteConfig, Vec<PreparedCase>), ConfigError> {
    let path = path.as_ref();
    let suite = YamlLoader::load_suite(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let cases = suite
        .cases
        .iter()
        .map(|case| PreparedCase {
            name: case.name.clone(),
            enabled: case.enabled,
            options: CaseBuilder::build(&suite, case, base_dir),
        })
        .collect();
    Ok((suite, cases))
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// A bare name is looked up on `PATH`; anything with a separator is a path
/// and resolves like the other suite paths.
pub fn resolve_binary(base_dir: &Path, binary: &str) -> String {
    if binary.contains('/') {
        resolve(base_dir, binary).display().to_string()
    } else {
        binary.to_string()
    }
}
