//! Retry logic.
//!
//! # Responsibilities
//! - Run one downstream call up to `max_attempts` times
//! - Sleep a constant delay between attempts (never after the last one)
//! - Collapse exhaustion into a single `DownstreamUnreachable` failure
//!
//! # Design Decisions
//! - The delay is a Tokio sleep, so dropping the future (call timeout) cancels it
//! - Per-attempt errors are logged, never propagated
//! - Each call owns its attempt counter; the policy itself is immutable

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::FailureKind;
use crate::observability::metrics;

/// Bounded retry loop with a fixed inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `call` until it succeeds or attempts are exhausted.
    pub async fn execute<T, E, F, Fut>(&self, mut call: F) -> Result<T, FailureKind>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Downstream call succeeded after retry");
                    }
                    metrics::record_retry_attempt("success");
                    return Ok(value);
                }
                Err(e) => {
                    metrics::record_retry_attempt("failure");

                    if attempt >= self.max_attempts {
                        tracing::error!(
                            attempt,
                            max_attempts = self.max_attempts,
                            error = %e,
                            "Downstream call failed, retries exhausted"
                        );
                        return Err(FailureKind::DownstreamUnreachable { attempts: attempt });
                    }

                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay = ?self.delay,
                        error = %e,
                        "Downstream call failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
