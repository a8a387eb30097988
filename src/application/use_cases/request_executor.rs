//! Resilient Request Executor
//!
//! Wraps a single remote-store call with bounded retries:
//! - Maintenance windows (HTTP 409) wait a fixed cooldown
//! - Rate limiting (HTTP 429) waits exactly what the server asked for
//! - Everything else is returned to the caller untouched

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::error::{AppError, Result, TransientFailure};
use crate::domain::sync_config::{
    SyncConfig, DEFAULT_MAINTENANCE_COOLDOWN_SECONDS, DEFAULT_MAX_ATTEMPTS,
};

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls made before giving up, including the first one
    pub max_attempts: u32,
    /// Wait after a maintenance response
    pub maintenance_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            maintenance_cooldown: Duration::from_secs(DEFAULT_MAINTENANCE_COOLDOWN_SECONDS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            maintenance_cooldown: Duration::from_secs(config.maintenance_cooldown_seconds),
        }
    }
}

/// Stateless between calls; one instance serves the whole run.
#[derive(Debug, Clone, Default)]
pub struct RequestExecutor {
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Runs `call` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// Returns `Ok(None)` when every attempt hit a transient failure. Callers
    /// that cannot continue without a value should use [`Self::execute_required`].
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            debug!(operation, attempt, "Sending request");

            let remote = match call().await {
                Ok(value) => return Ok(Some(value)),
                Err(AppError::Remote(remote)) => remote,
                Err(other) => return Err(other),
            };

            let wait = match remote.transient() {
                Some(TransientFailure::Maintenance) => {
                    warn!(
                        operation,
                        attempt,
                        "TestRail account undergoing maintenance. Retrying after {} seconds.",
                        self.policy.maintenance_cooldown.as_secs()
                    );
                    self.policy.maintenance_cooldown
                }
                Some(TransientFailure::RateLimited { retry_after_seconds }) => {
                    warn!(
                        operation,
                        attempt,
                        "TestRail API rate limit reached. Retrying after {} seconds.",
                        retry_after_seconds
                    );
                    Duration::from_secs(retry_after_seconds)
                }
                None => return Err(AppError::Remote(remote)),
            };

            if attempt < max_attempts {
                tokio::time::sleep(wait).await;
            }
        }

        error!(
            operation,
            "Failed to send request after {} attempts.", max_attempts
        );
        Ok(None)
    }

    /// Like [`Self::execute`], but an exhausted budget is an error.
    pub async fn execute_required<T, F, Fut>(&self, operation: &str, call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute(operation, call)
            .await?
            .ok_or_else(|| AppError::RetriesExhausted {
                operation: operation.to_string(),
                attempts: self.policy.max_attempts,
            })
    }
}
