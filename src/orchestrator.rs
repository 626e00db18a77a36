//! Call orchestration: rate limiter → breaker(retries) → fallback.
//!
//! # Data Flow
//! ```text
//! handle_request()
//!     → RateLimiter::admit(now)       rejected → 429, breaker untouched
//!     → CircuitBreaker::fire(
//!           RetryPolicy::execute(downstream.fetch))
//!     → CallOutcome
//!         Success            → 200 with the downstream payload
//!         Failure / Rejected → 503 with the fallback payload + circuit state
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::GatewayConfig;
use crate::downstream::{Downstream, Payload};
use crate::error::RejectReason;
use crate::observability::metrics::{self, MetricsObserver};
use crate::resilience::circuit_breaker::{BreakerStats, CircuitBreaker, CircuitState, TransitionObserver};
use crate::resilience::clock;
use crate::resilience::fallback::{fallback, FallbackPayload};
use crate::resilience::outcome::CallOutcome;
use crate::resilience::rate_limit::{RateLimitUsage, RateLimiter};
use crate::resilience::retries::RetryPolicy;

const TESTING_NOTE: &str = "A trial request is checking whether the downstream has recovered";

/// Body of a 429 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitedBody {
    pub error: &'static str,
    pub message: String,
    /// Whole seconds until a request would be admitted.
    pub retry_after: u64,
}

/// Breaker snapshot embedded in 503 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStateBody {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_attempt: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

/// Body of a 503 response: the fallback payload plus why it was served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableBody {
    #[serde(flatten)]
    pub fallback: FallbackPayload,
    pub error: &'static str,
    pub detail: String,
    pub circuit_state: CircuitStateBody,
}

/// Transport-neutral response for one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryResponse {
    Success(Payload),
    RateLimited(RateLimitedBody),
    Unavailable(UnavailableBody),
}

impl BoundaryResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            BoundaryResponse::Success(_) => 200,
            BoundaryResponse::RateLimited(_) => 429,
            BoundaryResponse::Unavailable(_) => 503,
        }
    }
}

/// Composition root for the guarded call.
pub struct CallOrchestrator<D> {
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    downstream: D,
}

impl<D: Downstream> CallOrchestrator<D> {
    pub fn new(limiter: RateLimiter, breaker: CircuitBreaker, retry: RetryPolicy, downstream: D) -> Self {
        Self {
            limiter,
            breaker,
            retry,
            downstream,
        }
    }

    /// Wire every component from configuration, with metrics on transitions.
    pub fn from_config(config: &GatewayConfig, downstream: D) -> Self {
        Self::with_observers(config, downstream, Vec::new())
    }

    /// Like `from_config`, with extra transition observers after the metrics one.
    pub fn with_observers(
        config: &GatewayConfig,
        downstream: D,
        extra: Vec<Arc<dyn TransitionObserver>>,
    ) -> Self {
        let mut observers: Vec<Arc<dyn TransitionObserver>> = vec![Arc::new(MetricsObserver)];
        observers.extend(extra);

        Self::new(
            RateLimiter::from_config(&config.rate_limit),
            CircuitBreaker::with_observers(config.circuit_breaker.clone(), observers),
            RetryPolicy::from_config(&config.retries),
            downstream,
        )
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn breaker_stats(&self) -> BreakerStats {
        self.breaker.stats()
    }

    pub fn rate_limit_usage(&self) -> RateLimitUsage {
        self.limiter.usage(clock::now())
    }

    /// Run one inbound request through the limiter, breaker and retries.
    pub async fn handle_request(&self) -> BoundaryResponse {
        let start = std::time::Instant::now();

        let outcome = self.guarded_call().await;
        let label = outcome.label();
        let response = self.respond(outcome);

        metrics::record_request(label, response.status_code(), start);
        response
    }

    async fn guarded_call(&self) -> CallOutcome<Payload> {
        let admission = self.limiter.admit(clock::now());
        if !admission.allowed {
            let retry_after = admission.retry_after.unwrap_or(Duration::from_secs(1));
            tracing::warn!(retry_after_secs = retry_after.as_secs(), "Rate limit exceeded");
            metrics::record_rate_limited();
            return CallOutcome::Rejected(RejectReason::RateLimited { retry_after });
        }

        self.breaker
            .fire(|| self.retry.execute(|| self.downstream.fetch()))
            .await
    }

    fn respond(&self, outcome: CallOutcome<Payload>) -> BoundaryResponse {
        match outcome {
            CallOutcome::Success(payload) => BoundaryResponse::Success(payload),
            CallOutcome::Rejected(RejectReason::RateLimited { retry_after }) => {
                let secs = retry_after.as_secs();
                BoundaryResponse::RateLimited(RateLimitedBody {
                    error: "Too Many Requests",
                    message: format!("Rate limit exceeded. Try again in {secs} seconds."),
                    retry_after: secs,
                })
            }
            CallOutcome::Rejected(reason) => {
                let note = matches!(reason, RejectReason::BreakerTesting).then_some(TESTING_NOTE);
                self.unavailable(reason.as_str(), reason.to_string(), note)
            }
            CallOutcome::Failure(kind) => {
                tracing::error!(error = %kind, "Serving fallback after failed call");
                self.unavailable(kind.as_str(), kind.to_string(), None)
            }
        }
    }

    fn unavailable(&self, error: &'static str, detail: String, note: Option<&'static str>) -> BoundaryResponse {
        let stats = self.breaker.stats();
        BoundaryResponse::Unavailable(UnavailableBody {
            fallback: fallback(),
            error,
            detail,
            circuit_state: CircuitStateBody {
                state: stats.state,
                consecutive_failures: stats.consecutive_failures,
                next_attempt: stats.next_attempt,
                note,
            },
        })
    }
}
