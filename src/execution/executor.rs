//! Retrying executor.
//!
//! Runs an [`Invocation`] and, when it fails with output matching the
//! policy's retryable errors, waits the policy delay and runs it again.

use std::time::Instant;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::core::error::{CommandError, TerraformError};
use crate::core::retry::RetryPolicy;

use super::command::{CommandOutput, Invocation};

/// Run `invocation` under `policy`.
pub async fn run(
    invocation: &Invocation,
    policy: &RetryPolicy,
) -> Result<CommandOutput, TerraformError> {
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        log_start(invocation, attempts);

        match invocation.execute().await {
            Ok(output) => {
                info!(
                    "'{}' finished in {:?} (attempts: {})",
                    invocation.subcommand(),
                    start.elapsed(),
                    attempts
                );
                return Ok(output);
            }
            Err(err) => {
                next_step(invocation, policy, attempts, err)?;
                sleep(policy.delay).await;
            }
        }
    }
}

/// Blocking variant of [`run`] for use outside the runtime, e.g. in `Drop`.
pub fn run_blocking(
    invocation: &Invocation,
    policy: &RetryPolicy,
) -> Result<CommandOutput, TerraformError> {
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        log_start(invocation, attempts);

        match invocation.execute_blocking() {
            Ok(output) => return Ok(output),
            Err(err) => {
                next_step(invocation, policy, attempts, err)?;
                std::thread::sleep(policy.delay);
            }
        }
    }
}

fn log_start(invocation: &Invocation, attempt: u32) {
    let dir = invocation
        .working_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| ".".to_string());
    info!(
        "Running command {} with args {:?} in {} (attempt {})",
        invocation.program(),
        invocation.args(),
        dir,
        attempt
    );
}

/// Ok means retry; otherwise the failure is returned as the final error.
fn next_step(
    invocation: &Invocation,
    policy: &RetryPolicy,
    attempts: u32,
    err: CommandError,
) -> Result<(), TerraformError> {
    let output = err.output();
    match policy.should_retry(attempts, &output) {
        Some(reason) => {
            warn!(
                "'{}' failed with a retryable error ({}); retrying in {:?}",
                invocation.subcommand(),
                reason,
                policy.delay
            );
            Ok(())
        }
        None => match policy.retry_reason(&output) {
            // Retryable cause, but the budget is spent.
            Some(reason) if attempts > 1 => Err(TerraformError::RetriesExhausted {
                attempts,
                reason: reason.to_string(),
                source: err,
            }),
            _ => Err(TerraformError::Command(err)),
        },
    }
}
