//! Suite runner.
//!
//! Each case runs the same contract: init and plan, plan again for the
//! report, require the report to be non-empty, then destroy. Destroy runs on
//! every path. Cases share nothing and may run concurrently up to a limit.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::PreparedCase;
use crate::core::options::Options;
use crate::core::types::RunId;
use crate::teardown::DestroyGuard;
use crate::terraform;

/// How a case ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    /// Init, plan or the runner itself failed.
    Fatal(String),
    /// The steps ran but the report did not meet expectations.
    AssertionFailed(String),
    /// The case is disabled in the suite file.
    Skipped,
}

impl CaseOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CaseOutcome::Fatal(_) | CaseOutcome::AssertionFailed(_))
    }
}

/// Result of one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub run_id: RunId,
    pub outcome: CaseOutcome,
    /// Size of the plan report in bytes.
    pub plan_bytes: usize,
    /// Whether destroy ran, and its error if it failed.
    pub destroyed: bool,
    pub destroy_error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl CaseReport {
    /// A failed destroy fails the case even if the plan passed.
    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure() || self.destroy_error.is_some()
    }
}

/// Result of a whole suite, in declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    #[serde(with = "millis")]
    pub duration: Duration,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.outcome == CaseOutcome::Passed && c.destroy_error.is_none())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| c.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.outcome == CaseOutcome::Skipped)
            .count()
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs prepared cases.
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    max_concurrent: usize,
}

impl SuiteRunner {
    pub fn new() -> Self {
        Self { max_concurrent: 1 }
    }

    /// Allow up to `n` cases at once (minimum 1).
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run all cases and collect their reports in input order.
    pub async fn run(&self, cases: Vec<PreparedCase>) -> SuiteReport {
        self.run_with(cases, |name, options| async move {
            run_case(&name, &options).await
        })
        .await
    }

    /// Run every enabled case through `body`. A task that panics gets a
    /// fatal report in its slot.
    async fn run_with<F, Fut>(&self, cases: Vec<PreparedCase>, body: F) -> SuiteReport
    where
        F: Fn(String, Options) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = CaseReport> + Send + 'static,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let total = cases.len();

        let mut set = JoinSet::new();
        let mut reports: Vec<Option<CaseReport>> = vec![None; total];
        let names: Vec<String> = cases.iter().map(|c| c.name.clone()).collect();

        for (index, case) in cases.into_iter().enumerate() {
            if !case.enabled {
                info!("Skipping disabled case '{}'", case.name);
                reports[index] = Some(skipped(case.name));
                continue;
            }
            let semaphore = semaphore.clone();
            let body = body.clone();
            set.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, body(case.name, case.options).await)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = Some(report),
                Err(e) => error!("Case task failed to complete: {}", e),
            }
        }

        let cases = reports
            .into_iter()
            .zip(names)
            .map(|(report, name)| report.unwrap_or_else(|| lost(&name)))
            .collect();

        let report = SuiteReport {
            started_at,
            duration: start.elapsed(),
            cases,
        };
        info!(
            "Suite finished in {:?}: {} passed, {} failed, {} skipped",
            report.duration,
            report.passed(),
            report.failed(),
            report.skipped()
        );
        report
    }
}

impl Default for SuiteRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one case: init and plan, plan, require a non-empty report, destroy.
pub async fn run_case(name: &str, options: &Options) -> CaseReport {
    let run_id = RunId::new();
    let started_at = Utc::now();
    let start = Instant::now();
    info!("Case '{}' started (run: {})", name, run_id.short());

    let guard = DestroyGuard::new(options);
    let mut plan_bytes = 0;

    let outcome = match terraform::init_and_plan(options).await {
        Err(e) => CaseOutcome::Fatal(format!("init and plan failed: {}", e)),
        Ok(_) => match terraform::plan(options).await {
            Err(e) => CaseOutcome::Fatal(format!("plan failed: {}", e)),
            Ok(report) => {
                plan_bytes = report.len();
                if is_empty_plan(&report) {
                    CaseOutcome::AssertionFailed("plan output is empty".to_string())
                } else {
                    CaseOutcome::Passed
                }
            }
        },
    };

    let destroy_error = match guard.destroy().await {
        Ok(_) => None,
        Err(e) => {
            warn!("Case '{}' destroy failed: {}", name, e);
            Some(e.to_string())
        }
    };

    match &outcome {
        CaseOutcome::Passed => info!("Case '{}' passed in {:?}", name, start.elapsed()),
        CaseOutcome::Fatal(msg) | CaseOutcome::AssertionFailed(msg) => {
            error!("Case '{}' failed: {}", name, msg)
        }
        CaseOutcome::Skipped => {}
    }

    CaseReport {
        name: name.to_string(),
        run_id,
        outcome,
        plan_bytes,
        destroyed: true,
        destroy_error,
        started_at,
        duration: start.elapsed(),
    }
}

/// A plan report counts as empty when it holds nothing but whitespace.
pub fn is_empty_plan(report: &str) -> bool {
    report.trim().is_empty()
}

fn skipped(name: String) -> CaseReport {
    CaseReport {
        name,
        run_id: RunId::new(),
        outcome: CaseOutcome::Skipped,
        plan_bytes: 0,
        destroyed: false,
        destroy_error: None,
        started_at: Utc::now(),
        duration: Duration::ZERO,
    }
}

fn lost(name: &str) -> CaseReport {
    CaseReport {
        outcome: CaseOutcome::Fatal("case task panicked".to_string()),
        // The guard destroys while unwinding.
        destroyed: true,
        ..skipped(name.to_string())
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
