//! Error taxonomy for guarded calls and gateway startup.
//!
//! # Taxonomy
//! ```text
//! RejectReason (never counted as a failure, never retried):
//!     RateLimited    → stopped before the breaker, no breaker stats
//!     BreakerOpen    → recorded as a breaker rejection
//!     BreakerTesting → recorded as a breaker rejection
//!
//! FailureKind (the only outcomes that hit the failure bucket):
//!     DownstreamUnreachable → retries exhausted
//!     CallTimeout           → call_timeout elapsed first
//! ```

use std::time::Duration;

use crate::config::loader::ConfigError;

/// Why a guarded call failed after it was admitted and executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureKind {
    /// Every retry attempt failed.
    #[error("downstream unreachable after {attempts} attempt(s)")]
    DownstreamUnreachable { attempts: u32 },

    /// The whole retry sequence outlived the breaker's call timeout.
    #[error("downstream call timed out after {}ms", timeout.as_millis())]
    CallTimeout { timeout: Duration },
}

impl FailureKind {
    /// Stable label for metrics and response bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::DownstreamUnreachable { .. } => "downstream_unreachable",
            FailureKind::CallTimeout { .. } => "call_timeout",
        }
    }
}

/// Why a call was turned away without reaching the downstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("rate limit exceeded, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("circuit breaker is open")]
    BreakerOpen,

    #[error("circuit breaker is testing downstream recovery")]
    BreakerTesting,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::RateLimited { .. } => "rate_limited",
            RejectReason::BreakerOpen => "circuit_open",
            RejectReason::BreakerTesting => "circuit_testing",
        }
    }
}

/// Fatal errors raised while starting the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build downstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(
            FailureKind::DownstreamUnreachable { attempts: 3 }.as_str(),
            "downstream_unreachable"
        );
        assert_eq!(RejectReason::BreakerTesting.as_str(), "circuit_testing");
    }

    #[test]
    fn test_rate_limited_message_reports_whole_seconds() {
        let reason = RejectReason::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(reason.to_string(), "rate limit exceeded, retry after 42s");
    }
}
