//! Retry policy for infrastructure commands.
//!
//! The binary fails transiently on flaky provider registries and network
//! resets. A policy lists the output fragments that identify such failures;
//! anything else fails on the first attempt.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Retries after the first attempt when using the default policy.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between attempts when using the default policy.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Output fragments that mark a failure as transient, with the explanation
/// logged when one matches.
pub const DEFAULT_RETRYABLE_ERRORS: &[(&str, &str)] = &[
    (
        "read: connection reset by peer",
        "Failed to reach helm charts repository.",
    ),
    ("transport is closing", "Failed to reach Kubernetes API."),
    (
        "unable to verify signature",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        "unable to verify checksum",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        "no provider exists with the given name",
        "Provider registry is unavailable.",
    ),
    (
        "registry service is unreachable",
        "Provider registry is unavailable.",
    ),
    (
        "connection reset by peer",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        "TLS handshake timeout",
        "Failed to retrieve plugin due to transient network error.",
    ),
];

/// Retry policy for a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts, not including the initial attempt (0 = no retries).
    pub max_attempts: u32,

    /// Fixed delay between retry attempts.
    #[serde(with = "serde_duration")]
    pub delay: Duration,

    /// Output fragment → explanation. Only failures whose output contains a
    /// fragment are retried.
    #[serde(default)]
    pub retryable_errors: BTreeMap<String, String>,
}

impl RetryPolicy {
    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            delay: Duration::ZERO,
            retryable_errors: BTreeMap::new(),
        }
    }

    /// Create a policy with fixed delay retries and no retryable errors yet.
    ///
    /// # Arguments
    /// * `max_attempts` - Maximum retry attempts (not including initial try)
    /// * `delay` - Fixed delay between retries
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            retryable_errors: BTreeMap::new(),
        }
    }

    /// The default policy: three retries five seconds apart on known
    /// transient failures.
    pub fn default_retryable() -> Self {
        Self::fixed(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY).with_default_errors()
    }

    /// Builder: add one retryable fragment.
    pub fn with_error(mut self, fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        self.retryable_errors.insert(fragment.into(), reason.into());
        self
    }

    /// Builder: add the default retryable fragments, keeping existing ones.
    pub fn with_default_errors(mut self) -> Self {
        for (fragment, reason) in DEFAULT_RETRYABLE_ERRORS {
            self.retryable_errors
                .entry((*fragment).to_string())
                .or_insert_with(|| (*reason).to_string());
        }
        self
    }

    /// Check if retries are enabled.
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0 && !self.retryable_errors.is_empty()
    }

    /// Find the explanation for a retryable failure in `output`, if any.
    pub fn retry_reason(&self, output: &str) -> Option<&str> {
        self.retryable_errors
            .iter()
            .find(|(fragment, _)| output.contains(fragment.as_str()))
            .map(|(_, reason)| reason.as_str())
    }

    /// Decide whether to retry after `attempts` failed attempts with the
    /// given output. Returns the explanation when a retry should happen.
    pub fn should_retry(&self, attempts: u32, output: &str) -> Option<&str> {
        if attempts > self.max_attempts {
            return None;
        }
        self.retry_reason(output)
    }
}

impl Default for RetryPolicy {
    /// Default policy: no retries.
    fn default() -> Self {
        Self::none()
    }
}

/// Serializes Duration as whole seconds, matching the suite file format.
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
