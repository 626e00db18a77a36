//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call:
//!     → rate_limit.rs (sliding-window admission, before anything else)
//!     → circuit_breaker/ (short-circuit when open, enforce call timeout)
//!         → retries.rs (bounded attempts, constant delay)
//!             → downstream call
//!     → fallback.rs (placeholder payload when the call cannot be served)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every guarded call has a deadline
//! - The limiter never touches breaker statistics
//! - All timing reads the Tokio clock (clock.rs), so tests can pause time

pub mod circuit_breaker;
pub mod clock;
pub mod fallback;
pub mod outcome;
pub mod rate_limit;
pub mod retries;

pub use circuit_breaker::{BreakerStats, CircuitBreaker, CircuitState, TransitionObserver};
pub use fallback::{fallback, FallbackPayload};
pub use outcome::CallOutcome;
pub use rate_limit::{Admission, RateLimitUsage, RateLimiter};
pub use retries::RetryPolicy;
