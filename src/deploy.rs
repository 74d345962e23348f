//! Deploy workflow.
//!
//! Chains the operations the way a release pipeline runs them: planning and
//! applying always start with `init` and `validate`, while `destroy` runs on
//! its own. Applying or destroying without a saved plan requires explicit
//! approval.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::error::TerraformError;
use crate::core::options::Options;
use crate::terraform;

/// A deploy action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Init,
    Validate,
    Fmt,
    Plan,
    Apply,
    Destroy,
}

impl DeployAction {
    pub const ALL: [DeployAction; 6] = [
        DeployAction::Init,
        DeployAction::Validate,
        DeployAction::Fmt,
        DeployAction::Plan,
        DeployAction::Apply,
        DeployAction::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployAction::Init => "init",
            DeployAction::Validate => "validate",
            DeployAction::Fmt => "fmt",
            DeployAction::Plan => "plan",
            DeployAction::Apply => "apply",
            DeployAction::Destroy => "destroy",
        }
    }
}

impl fmt::Display for DeployAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployAction {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeployAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DeployError::UnknownAction(s.to_string()))
    }
}

/// Errors from the deploy workflow.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("'{0}' changes infrastructure; pass --auto-approve to confirm")]
    AutoApproveRequired(DeployAction),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("{action} failed: {source}")]
    Step {
        action: &'static str,
        #[source]
        source: TerraformError,
    },
}

/// Runs deploy actions against one working directory.
#[derive(Debug, Clone)]
pub struct Deployer {
    options: Options,
    auto_approve: bool,
}

impl Deployer {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            auto_approve: false,
        }
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run `action`. Returns the text worth showing the user, if any.
    pub async fn run(&self, action: DeployAction) -> Result<Option<String>, DeployError> {
        let dir = self.options.working_dir();
        if !dir.is_dir() {
            return Err(DeployError::DirectoryNotFound(dir.display().to_string()));
        }

        match action {
            DeployAction::Init => {
                self.init().await?;
                Ok(None)
            }
            DeployAction::Validate => {
                self.init().await?;
                self.validate().await?;
                Ok(None)
            }
            DeployAction::Fmt => {
                info!("Checking formatting...");
                terraform::fmt_check(&self.options)
                    .await
                    .map_err(|e| step("fmt", e))?;
                info!("Formatting check passed");
                Ok(None)
            }
            DeployAction::Plan => {
                self.init().await?;
                self.validate().await?;
                info!("Creating plan...");
                let plan = terraform::plan(&self.options)
                    .await
                    .map_err(|e| step("plan", e))?;
                info!("Plan created successfully");
                Ok(Some(plan))
            }
            DeployAction::Apply => {
                if self.options.plan_file().is_none() && !self.auto_approve {
                    return Err(DeployError::AutoApproveRequired(action));
                }
                self.init().await?;
                self.validate().await?;
                info!("Applying configuration...");
                let out = terraform::apply(&self.options)
                    .await
                    .map_err(|e| step("apply", e))?;
                info!("Apply completed successfully");
                Ok(Some(out))
            }
            DeployAction::Destroy => {
                if !self.auto_approve {
                    return Err(DeployError::AutoApproveRequired(action));
                }
                warn!("Destroying managed infrastructure...");
                let out = terraform::destroy(&self.options)
                    .await
                    .map_err(|e| step("destroy", e))?;
                info!("Destroy completed successfully");
                Ok(Some(out))
            }
        }
    }

    async fn init(&self) -> Result<(), DeployError> {
        info!("Initializing...");
        terraform::init(&self.options)
            .await
            .map_err(|e| step("init", e))?;
        info!("Initialized successfully");
        Ok(())
    }

    async fn validate(&self) -> Result<(), DeployError> {
        info!("Validating configuration...");
        terraform::validate(&self.options)
            .await
            .map_err(|e| step("validate", e))?;
        info!("Validation successful");
        Ok(())
    }
}

fn step(action: &'static str, source: TerraformError) -> DeployError {
    DeployError::Step { action, source }
}
