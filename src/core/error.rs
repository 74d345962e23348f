//! Error types for running the infrastructure binary.

use std::time::Duration;
use thiserror::Error;

/// Errors from a single invocation of the binary.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The process could not be started (binary missing, bad working dir).
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish in time and was killed.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// The process exited with a status the caller does not accept.
    #[error("command exited with code {code}: {}", summarize(.stderr, .stdout))]
    Failed {
        code: i32,
        stdout: String,
        stderr: String,
    },
}

impl CommandError {
    /// Combined output used to match retryable failures.
    pub fn output(&self) -> String {
        match self {
            CommandError::Failed { stdout, stderr, .. } => format!("{}\n{}", stdout, stderr),
            other => other.to_string(),
        }
    }

    /// Exit code, when the process ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Failed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Errors from an operation such as `plan` or `destroy`.
#[derive(Debug, Error)]
pub enum TerraformError {
    /// The command failed without a retryable cause.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The command kept failing with a retryable cause.
    #[error("gave up after {attempts} attempts ({reason}): {source}")]
    RetriesExhausted {
        attempts: u32,
        reason: String,
        #[source]
        source: CommandError,
    },

    /// The binary produced output that could not be interpreted.
    #[error("invalid output from '{command}': {message}")]
    InvalidOutput { command: String, message: String },

    /// `fmt -check` listed files that need formatting.
    #[error("files need formatting: {}", .0.join(", "))]
    Unformatted(Vec<String>),
}

impl TerraformError {
    /// The underlying command failure, if there is one.
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            TerraformError::Command(e) => Some(e),
            TerraformError::RetriesExhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn summarize(stderr: &str, stdout: &str) -> String {
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    let text = text.trim();
    if text.is_empty() {
        return "<no output>".to_string();
    }
    text.lines().last().unwrap_or(text).to_string()
}
