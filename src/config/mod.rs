//! Suite configuration loading and parsing.
//!
//! A suite file lists named cases, each a directory with variables and an
//! optional target restriction, plus settings shared by all cases.

mod builder;
mod error;
mod types;
mod yaml;

pub use builder::{CaseBuilder, PreparedCase, load_cases, resolve_binary};
pub use error::ConfigError;
pub use types::{CaseConfig, RetryConfig, SuiteConfig};
pub use yaml::YamlLoader;
