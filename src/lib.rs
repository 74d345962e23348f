//! infratest - drive terraform/tofu from Rust tests.
//!
//! Build an [`Options`] for a directory of definitions, run operations from
//! [`terraform`], and arm a [`DestroyGuard`] so the infrastructure is torn
//! down on every exit path.

pub mod config;
pub mod core;
pub mod deploy;
pub mod execution;
pub mod suite;
pub mod teardown;
pub mod terraform;

pub use config::{CaseConfig, ConfigError, PreparedCase, SuiteConfig, YamlLoader, load_cases};
pub use core::environment::Environment;
pub use core::error::{CommandError, TerraformError};
pub use core::options::{Options, OptionsBuilder};
pub use core::retry::RetryPolicy;
pub use core::types::RunId;
pub use core::vars::Vars;
pub use deploy::{DeployAction, DeployError, Deployer};
pub use suite::{CaseOutcome, CaseReport, SuiteReport, SuiteRunner, is_empty_plan, run_case};
pub use teardown::{DestroyGuard, with_teardown};
pub use terraform::PlanChanges;
