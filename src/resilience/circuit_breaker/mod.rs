//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through and are counted
//! - Open: downstream assumed down, calls are short-circuited
//! - Half-Open: a single trial call tests whether the downstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: calls >= volume_threshold and error% >= threshold in the rolling window
//! Open → Half-Open: reset timer elapses
//! Half-Open → Closed: trial succeeds (rolling stats reset)
//! Half-Open → Open: trial fails (reset timer restarted)
//! ```
//!
//! # Design Decisions
//! - One mutex owns state, window, trial flag and timer handle
//! - Transitions go through a pure `transition` function and are reported
//!   to observers under that mutex, so they are never missed or reordered
//! - The reset timer is a task owned by the breaker and aborted on every
//!   transition; a generation counter discards stale wakeups and outcomes
//! - The call timeout drops the in-flight future, so late results never land

pub mod breaker;
pub mod state;
pub mod window;

pub use breaker::{BreakerStats, ChannelObserver, CircuitBreaker, TransitionObserver};
pub use state::{transition, BreakerEvent, CircuitState, Transition};
pub use window::{RollingWindow, Sample, WindowCounts};
