//! Operations against a working directory.
//!
//! Each function takes the run configuration by reference, builds the
//! argument list for its subcommand and runs the binary through the retrying
//! executor. Text-producing operations return stdout.
//!
//! ```rust,no_run
//! use infratest::{terraform, Options};
//!
//! # async fn example() -> Result<(), infratest::TerraformError> {
//! let options = Options::builder("opentofu/examples/basic")
//!     .var("environment", "test")
//!     .build()
//!     .with_default_retryable_errors();
//!
//! terraform::init_and_plan(&options).await?;
//! let plan = terraform::plan(&options).await?;
//! assert!(!plan.is_empty());
//! terraform::destroy(&options).await?;
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use tracing::info;

use crate::core::error::{CommandError, TerraformError};
use crate::core::options::Options;
use crate::execution::{CommandOutput, Invocation, args, executor};

/// Outcome of `plan -detailed-exitcode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChanges {
    /// Exit code 0: infrastructure matches the configuration.
    None,
    /// Exit code 2: the plan contains changes.
    Pending,
}

async fn run(options: &Options, args: Vec<String>) -> Result<CommandOutput, TerraformError> {
    let invocation = Invocation::for_options(options, args);
    executor::run(&invocation, options.retry()).await
}

/// Run `init`. Returns stdout.
pub async fn init(options: &Options) -> Result<String, TerraformError> {
    Ok(run(options, args::init(options)).await?.stdout)
}

/// Run `init` then `plan`. Returns the plan's stdout.
pub async fn init_and_plan(options: &Options) -> Result<String, TerraformError> {
    init(options).await?;
    plan(options).await
}

/// Run `plan` and return its report.
pub async fn plan(options: &Options) -> Result<String, TerraformError> {
    Ok(run(options, args::plan(options)).await?.stdout)
}

/// Run `plan -detailed-exitcode` and report whether changes are pending.
pub async fn plan_exit_code(options: &Options) -> Result<PlanChanges, TerraformError> {
    let invocation =
        Invocation::for_options(options, args::plan_detailed(options)).accepting(&[0, 2]);
    let output = executor::run(&invocation, options.retry()).await?;
    Ok(if output.code == 2 {
        PlanChanges::Pending
    } else {
        PlanChanges::None
    })
}

/// Run `apply`. Returns stdout.
pub async fn apply(options: &Options) -> Result<String, TerraformError> {
    Ok(run(options, args::apply(options)).await?.stdout)
}

/// Run `init` then `apply`.
pub async fn init_and_apply(options: &Options) -> Result<String, TerraformError> {
    init(options).await?;
    apply(options).await
}

/// Run `destroy`. Returns stdout.
pub async fn destroy(options: &Options) -> Result<String, TerraformError> {
    info!(
        "Destroying resources in {}",
        options.working_dir().display()
    );
    Ok(run(options, args::destroy(options)).await?.stdout)
}

/// Blocking `destroy`, used when no runtime can be awaited.
pub fn destroy_blocking(options: &Options) -> Result<String, TerraformError> {
    let invocation = Invocation::for_options(options, args::destroy(options));
    Ok(executor::run_blocking(&invocation, options.retry())?.stdout)
}

/// Run `validate`. Returns stdout.
pub async fn validate(options: &Options) -> Result<String, TerraformError> {
    Ok(run(options, args::validate(options)).await?.stdout)
}

/// Run `init` then `validate`.
pub async fn init_and_validate(options: &Options) -> Result<String, TerraformError> {
    init(options).await?;
    validate(options).await
}

/// Run `fmt -check -recursive`. Fails with the unformatted files listed.
pub async fn fmt_check(options: &Options) -> Result<(), TerraformError> {
    match run(options, args::fmt_check()).await {
        Ok(_) => Ok(()),
        Err(TerraformError::Command(CommandError::Failed { code: 3, stdout, .. })) => {
            Err(TerraformError::Unformatted(
                stdout
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect(),
            ))
        }
        Err(e) => Err(e),
    }
}

/// Read a single output as a string.
pub async fn output(options: &Options, name: &str) -> Result<String, TerraformError> {
    let stdout = run(options, args::output_raw(name)).await?.stdout;
    Ok(stdout.trim().to_string())
}

/// Read all outputs as JSON, keyed by output name.
pub async fn output_json(options: &Options) -> Result<Value, TerraformError> {
    let stdout = run(options, args::output_json()).await?.stdout;
    serde_json::from_str(&stdout).map_err(|e| TerraformError::InvalidOutput {
        command: "output -json".to_string(),
        message: e.to_string(),
    })
}
