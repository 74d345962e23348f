//! A single invocation of an external program.
//!
//! [`Invocation`] captures stdout and stderr, applies an optional timeout and
//! maps the exit status to a [`CommandError`]. It can run on the tokio
//! runtime or synchronously, the latter for teardown from `Drop`.
//!
//! ```rust
//! use infratest::execution::Invocation;
//! use std::time::Duration;
//!
//! let invocation = Invocation::builder("terraform")
//!     .args(["plan", "-input=false"])
//!     .working_dir("opentofu/examples/basic")
//!     .env("TF_LOG", "INFO")
//!     .timeout(Duration::from_secs(600))
//!     .build();
//!
//! assert_eq!(invocation.args(), &["plan", "-input=false"]);
//! ```
//!
//! **Process termination**: on timeout the child is killed when the output
//! future is dropped. The blocking path has no timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::core::environment::Environment;
use crate::core::error::CommandError;
use crate::core::options::Options;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// A fully described external command.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    environment: Environment,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    /// Exit codes treated as success.
    ok_codes: Vec<i32>,
}

impl Invocation {
    pub fn builder(program: impl Into<String>) -> InvocationBuilder {
        InvocationBuilder::new(program)
    }

    /// Invocation of the options' binary in its working directory.
    pub fn for_options(options: &Options, args: Vec<String>) -> Self {
        let mut builder = Invocation::builder(options.binary())
            .args(args)
            .environment(options.env().clone())
            .working_dir(options.working_dir());
        if let Some(duration) = options.timeout() {
            builder = builder.timeout(duration);
        }
        builder.build()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Builder-style override of the accepted exit codes.
    pub fn accepting(mut self, codes: &[i32]) -> Self {
        self.ok_codes = codes.to_vec();
        self
    }

    /// Subcommand name for log lines, e.g. `plan`.
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    /// Run on the tokio runtime.
    pub async fn execute(&self) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in self.environment.for_process() {
            cmd.env(key, value);
        }
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = match self.timeout {
            Some(duration) => timeout(duration, cmd.output())
                .await
                .map_err(|_| CommandError::Timeout(duration))?
                .map_err(|e| self.spawn_error(e))?,
            None => cmd.output().await.map_err(|e| self.spawn_error(e))?,
        };

        self.finish(output)
    }

    /// Run synchronously on the current thread.
    pub fn execute_blocking(&self) -> Result<CommandOutput, CommandError> {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in self.environment.for_process() {
            cmd.env(key, value);
        }
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());

        let output = cmd.output().map_err(|e| self.spawn_error(e))?;
        self.finish(output)
    }

    fn spawn_error(&self, source: std::io::Error) -> CommandError {
        CommandError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    fn finish(&self, output: std::process::Output) -> Result<CommandOutput, CommandError> {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        // Killed by a signal: no exit code.
        let code = output.status.code().unwrap_or(-1);

        for line in stdout.lines() {
            debug!(target: "infratest::stdout", "{}", line);
        }
        for line in stderr.lines() {
            debug!(target: "infratest::stderr", "{}", line);
        }

        if self.ok_codes.contains(&code) {
            Ok(CommandOutput {
                code,
                stdout,
                stderr,
            })
        } else {
            Err(CommandError::Failed {
                code,
                stdout,
                stderr,
            })
        }
    }
}

/// Builder for [`Invocation`].
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    program: String,
    args: Vec<String>,
    environment: Environment,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl InvocationBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            environment: Environment::default(),
            working_dir: None,
            timeout: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn environment(mut self, env: Environment) -> Self {
        self.environment = env;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.set(key, value);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn build(self) -> Invocation {
        Invocation {
            program: self.program,
            args: self.args,
            environment: self.environment,
            working_dir: self.working_dir,
            timeout: self.timeout,
            ok_codes: vec![0],
        }
    }
}
