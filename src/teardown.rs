//! Guaranteed teardown.
//!
//! A test that provisions infrastructure must destroy it on every exit path.
//! [`DestroyGuard`] arms a `destroy` for a run configuration: awaiting
//! [`DestroyGuard::destroy`] runs it on the runtime, and dropping an armed
//! guard (early `?` return, failed assertion, panic) runs it synchronously.
//!
//! ```rust,no_run
//! use infratest::{terraform, DestroyGuard, Options};
//!
//! # async fn example() -> Result<(), infratest::TerraformError> {
//! let options = Options::builder("opentofu/examples/basic")
//!     .var("environment", "test")
//!     .build();
//!
//! let teardown = DestroyGuard::new(&options);
//! terraform::init_and_plan(&options).await?;
//! let plan = terraform::plan(&options).await?;
//! assert!(!plan.is_empty());
//! teardown.destroy().await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use tracing::{error, info};

use crate::core::error::TerraformError;
use crate::core::options::Options;
use crate::terraform;

/// Runs `destroy` for its options exactly once.
#[must_use = "dropping the guard immediately destroys the infrastructure"]
#[derive(Debug)]
pub struct DestroyGuard {
    options: Options,
    armed: bool,
}

impl DestroyGuard {
    /// Arm a destroy for `options`.
    pub fn new(options: &Options) -> Self {
        Self {
            options: options.clone(),
            armed: true,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Run destroy now and disarm the guard.
    pub async fn destroy(mut self) -> Result<String, TerraformError> {
        self.armed = false;
        terraform::destroy(&self.options).await
    }

    /// Disarm without destroying, e.g. to keep resources for debugging.
    pub fn disarm(mut self) -> Options {
        self.armed = false;
        self.options.clone()
    }
}

impl Drop for DestroyGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        info!(
            "Running deferred destroy for {}",
            self.options.working_dir().display()
        );
        // Cannot await in drop; the child process does not need the runtime.
        if let Err(e) = terraform::destroy_blocking(&self.options) {
            error!("Deferred destroy failed: {}", e);
        }
    }
}

/// Run `body` with a clone of `options`, then destroy.
///
/// Destroy runs whether the body succeeds, fails or panics. When the body
/// fails its error is returned and a destroy failure is only logged.
pub async fn with_teardown<F, Fut, T>(options: &Options, body: F) -> Result<T, TerraformError>
where
    F: FnOnce(Options) -> Fut,
    Fut: Future<Output = Result<T, TerraformError>>,
{
    let guard = DestroyGuard::new(options);
    let result = body(options.clone()).await;
    let destroyed = guard.destroy().await;

    match (result, destroyed) {
        (Ok(value), Ok(_)) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), destroyed) => {
            if let Err(destroy_err) = destroyed {
                error!("Destroy after failure also failed: {}", destroy_err);
            }
            Err(e)
        }
    }
}
