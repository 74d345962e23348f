//! YAML suite parsing and validation.

use std::collections::HashSet;
use std::path::Path;

use super::error::ConfigError;
use super::types::SuiteConfig;

/// Loader for suite files.
pub struct YamlLoader;

impl YamlLoader {
    /// Parse and validate a suite from a YAML string.
    pub fn parse_suite(yaml: &str) -> Result<SuiteConfig, ConfigError> {
        let suite: SuiteConfig = serde_yaml::from_str(yaml)?;
        Self::validate(&suite)?;
        Ok(suite)
    }

    /// Load and validate a suite file.
    pub fn load_suite(path: impl AsRef<Path>) -> Result<SuiteConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let suite: SuiteConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::validate(&suite)?;
        Ok(suite)
    }

    fn validate(suite: &SuiteConfig) -> Result<(), ConfigError> {
        if suite.cases.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "suite must have at least one case".to_string(),
            ));
        }
        if suite.max_concurrent_cases == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "max_concurrent_cases must be at least 1".to_string(),
            ));
        }
        if let Some(binary) = &suite.binary {
            if binary.trim().is_empty() {
                return Err(ConfigError::InvalidConfig("binary must not be empty".to_string()));
            }
        }

        let mut names = HashSet::new();
        for case in &suite.cases {
            if case.name.trim().is_empty() {
                return Err(ConfigError::MissingField("cases[].name".to_string()));
            }
            if case.dir.trim().is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "dir (case '{}')",
                    case.name
                )));
            }
            if !names.insert(case.name.as_str()) {
                return Err(ConfigError::InvalidConfig(format!(
                    "duplicate case name '{}'",
                    case.name
                )));
            }
            if let Some(target) = case.targets.iter().find(|t| t.trim().is_empty()) {
                return Err(ConfigError::InvalidConfig(format!(
                    "case '{}' has an empty target '{}'",
                    case.name, target
                )));
            }
        }
        Ok(())
    }
}
