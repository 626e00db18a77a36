//! Circuit breaker around the retried downstream call.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::config::CircuitBreakerConfig;
use crate::error::{FailureKind, RejectReason};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::state::{transition, BreakerEvent, CircuitState, Transition};
use crate::resilience::circuit_breaker::window::{RollingWindow, Sample};
use crate::resilience::clock::{self, Instant};
use crate::resilience::outcome::CallOutcome;

/// Receives every state change, in order, at the moment it happens.
///
/// Observers run while the breaker's lock is held: they must be quick and
/// must not call back into the breaker.
pub trait TransitionObserver: Send + Sync {
    fn on_transition(&self, transition: &Transition);
}

/// Observer that forwards transitions into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Transition>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Transition>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TransitionObserver for ChannelObserver {
    fn on_transition(&self, transition: &Transition) {
        let _ = self.tx.send(*transition);
    }
}

/// Point-in-time view of the breaker over its rolling window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStats {
    pub state: CircuitState,
    pub fires: u64,
    pub successes: u64,
    pub failures: u64,
    pub rejects: u64,
    pub timeouts: u64,
    /// Failed share of executed calls, 0 to 100.
    pub error_percentage: f64,
    pub consecutive_failures: u32,
    /// Wall-clock milliseconds at which a trial call will be allowed.
    pub next_attempt: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permit {
    Normal { generation: u64 },
    Trial { generation: u64 },
}

impl Permit {
    fn generation(&self) -> u64 {
        match *self {
            Permit::Normal { generation } | Permit::Trial { generation } => generation,
        }
    }
}

struct Inner {
    state: CircuitState,
    window: RollingWindow,
    consecutive_failures: u32,
    /// Set while open: when the reset timeout expires.
    next_attempt: Option<Instant>,
    trial_in_flight: bool,
    /// Bumped on every transition; stale timers and trials compare against it.
    generation: u64,
    reset_timer: Option<AbortHandle>,
}

struct Shared {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    observers: Vec<Arc<dyn TransitionObserver>>,
}

/// Three-state breaker with rolling statistics and a per-call timeout.
///
/// Cloning is cheap and every clone drives the same circuit.
#[derive(Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_observers(config, Vec::new())
    }

    pub fn with_observers(
        config: CircuitBreakerConfig,
        observers: Vec<Arc<dyn TransitionObserver>>,
    ) -> Self {
        let window = RollingWindow::new(config.rolling_window(), config.bucket_count, clock::now());
        Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(Inner {
                    state: CircuitState::Closed,
                    window,
                    consecutive_failures: 0,
                    next_attempt: None,
                    trial_in_flight: false,
                    generation: 0,
                    reset_timer: None,
                }),
                observers,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.shared.lock().state
    }

    pub fn stats(&self) -> BreakerStats {
        let now = clock::now();
        let inner = self.shared.lock();
        let totals = inner.window.totals(now);

        BreakerStats {
            state: inner.state,
            fires: totals.fires,
            successes: totals.successes,
            failures: totals.failures,
            rejects: totals.rejections,
            timeouts: totals.timeouts,
            error_percentage: totals.error_percentage(),
            consecutive_failures: inner.consecutive_failures,
            next_attempt: inner.next_attempt.map(clock::to_unix_millis),
        }
    }

    /// Run `call` through the breaker.
    ///
    /// `call` is only invoked when the circuit admits it, and is raced
    /// against the call timeout; on timeout its future is dropped.
    pub async fn fire<T, F, Fut>(&self, call: F) -> CallOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FailureKind>>,
    {
        let permit = match self.shared.acquire() {
            Ok(permit) => permit,
            Err(reason) => {
                tracing::debug!(reason = reason.as_str(), "Call short-circuited by breaker");
                metrics::record_breaker_rejection(reason.as_str());
                return CallOutcome::Rejected(reason);
            }
        };

        let mut guard = PermitGuard {
            shared: &self.shared,
            permit,
            resolved: false,
        };

        let timeout = self.shared.config.call_timeout();
        let result = match tokio::time::timeout(timeout, call()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Guarded call timed out");
                Err(FailureKind::CallTimeout { timeout })
            }
        };

        guard.resolved = true;
        self.shared.record_outcome(permit, result.as_ref().err());

        match result {
            Ok(value) => CallOutcome::Success(value),
            Err(kind) => CallOutcome::Failure(kind),
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn acquire(self: &Arc<Self>) -> Result<Permit, RejectReason> {
        let now = clock::now();
        let mut inner = self.lock();
        inner.window.record(now, Sample::Fire);

        // The timer task may not have run yet; the deadline is authoritative.
        if inner.state == CircuitState::Open && inner.next_attempt.is_some_and(|at| now >= at) {
            self.apply(&mut inner, BreakerEvent::ResetTimeoutElapsed, now);
        }

        match inner.state {
            CircuitState::Closed => Ok(Permit::Normal {
                generation: inner.generation,
            }),
            CircuitState::Open => {
                inner.window.record(now, Sample::Rejection);
                Err(RejectReason::BreakerOpen)
            }
            CircuitState::HalfOpen if inner.trial_in_flight => {
                inner.window.record(now, Sample::Rejection);
                Err(RejectReason::BreakerTesting)
            }
            CircuitState::HalfOpen => {
                inner.trial_in_flight = true;
                Ok(Permit::Trial {
                    generation: inner.generation,
                })
            }
        }
    }

    fn record_outcome(self: &Arc<Self>, permit: Permit, failure: Option<&FailureKind>) {
        let now = clock::now();
        let mut inner = self.lock();

        // Admitted before the last transition: the counts it would land in are gone.
        if permit.generation() != inner.generation {
            tracing::debug!(
                admitted_in = permit.generation(),
                current = inner.generation,
                "Discarding outcome from a previous breaker generation"
            );
            return;
        }

        match failure {
            None => {
                inner.window.record(now, Sample::Success);
                inner.consecutive_failures = 0;
            }
            Some(FailureKind::CallTimeout { .. }) => {
                inner.window.record(now, Sample::Timeout);
                inner.consecutive_failures += 1;
            }
            Some(FailureKind::DownstreamUnreachable { .. }) => {
                inner.window.record(now, Sample::Failure);
                inner.consecutive_failures += 1;
            }
        }

        match permit {
            Permit::Trial { .. } => {
                if inner.state != CircuitState::HalfOpen {
                    return;
                }
                inner.trial_in_flight = false;
                let event = if failure.is_none() {
                    BreakerEvent::TrialSucceeded
                } else {
                    BreakerEvent::TrialFailed
                };
                self.apply(&mut inner, event, now);
            }
            Permit::Normal { .. } => {
                if failure.is_some() && inner.state == CircuitState::Closed && self.should_trip(&inner, now) {
                    self.apply(&mut inner, BreakerEvent::Tripped, now);
                }
            }
        }
    }

    fn should_trip(&self, inner: &Inner, now: Instant) -> bool {
        let totals = inner.window.totals(now);
        let calls = totals.calls();
        calls >= u64::from(self.config.volume_threshold)
            && totals.failures * 100 >= u64::from(self.config.error_threshold_percentage) * calls
    }

    /// Apply `event`; every state change goes through here.
    fn apply(self: &Arc<Self>, inner: &mut Inner, event: BreakerEvent, now: Instant) {
        let Some(next) = transition(inner.state, event) else {
            return;
        };

        let from = inner.state;
        inner.state = next;
        inner.generation += 1;
        inner.trial_in_flight = false;
        if let Some(timer) = inner.reset_timer.take() {
            timer.abort();
        }

        match next {
            CircuitState::Open => {
                let reset_timeout = self.config.reset_timeout();
                inner.next_attempt = Some(now + reset_timeout);
                inner.reset_timer = self.arm_reset_timer(inner.generation, reset_timeout);
            }
            CircuitState::HalfOpen => {
                inner.next_attempt = None;
            }
            CircuitState::Closed => {
                inner.next_attempt = None;
                inner.consecutive_failures = 0;
                inner.window.reset();
            }
        }

        let change = Transition {
            from,
            to: next,
            event,
            at: now,
        };
        tracing::warn!(
            from = %from,
            to = %next,
            event = ?event,
            consecutive_failures = inner.consecutive_failures,
            "Circuit breaker state changed"
        );
        for observer in &self.observers {
            observer.on_transition(&change);
        }
    }

    fn arm_reset_timer(self: &Arc<Self>, generation: u64, delay: Duration) -> Option<AbortHandle> {
        // Outside a runtime the deadline check in `acquire` still reopens the circuit.
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let shared: Weak<Shared> = Arc::downgrade(self);

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.on_reset_timeout(generation);
            }
        });
        Some(task.abort_handle())
    }

    fn on_reset_timeout(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::Open {
            inner.reset_timer = None;
            self.apply(&mut inner, BreakerEvent::ResetTimeoutElapsed, clock::now());
        }
    }
}

/// Frees the half-open trial slot if the caller abandons `fire` mid-call.
struct PermitGuard<'a> {
    shared: &'a Arc<Shared>,
    permit: Permit,
    resolved: bool,
}

impl Drop for PermitGuard<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        if let Permit::Trial { generation } = self.permit {
            let mut inner = self.shared.lock();
            if inner.generation == generation && inner.state == CircuitState::HalfOpen {
                tracing::debug!("Half-open trial abandoned by caller");
                inner.trial_in_flight = false;
            }
        }
    }
}
