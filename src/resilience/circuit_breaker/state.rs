//! Breaker state machine.
//!
//! # State Transitions
//! ```text
//! Closed   --Tripped-------------> Open
//! Open     --ResetTimeoutElapsed-> HalfOpen
//! HalfOpen --TrialSucceeded------> Closed
//! HalfOpen --TrialFailed---------> Open
//! ```
//!
//! Any other (state, event) pair is not a transition and yields `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resilience::clock::Instant;

/// Current state of the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }

    /// Numeric encoding for the state gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that may move the breaker between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerEvent {
    /// Error rate crossed the threshold with enough volume.
    Tripped,
    /// The open period is over.
    ResetTimeoutElapsed,
    TrialSucceeded,
    TrialFailed,
}

/// One observed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CircuitState,
    pub to: CircuitState,
    pub event: BreakerEvent,
    pub at: Instant,
}

/// Pure transition function.
pub fn transition(state: CircuitState, event: BreakerEvent) -> Option<CircuitState> {
    use BreakerEvent::*;
    use CircuitState::*;

    match (state, event) {
        (Closed, Tripped) => Some(Open),
        (Open, ResetTimeoutElapsed) => Some(HalfOpen),
        (HalfOpen, TrialSucceeded) => Some(Closed),
        (HalfOpen, TrialFailed) => Some(Open),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert_eq!(transition(CircuitState::Closed, BreakerEvent::Tripped), Some(CircuitState::Open));
        assert_eq!(
            transition(CircuitState::Open, BreakerEvent::ResetTimeoutElapsed),
            Some(CircuitState::HalfOpen)
        );
        assert_eq!(
            transition(CircuitState::HalfOpen, BreakerEvent::TrialSucceeded),
            Some(CircuitState::Closed)
        );
        assert_eq!(
            transition(CircuitState::HalfOpen, BreakerEvent::TrialFailed),
            Some(CircuitState::Open)
        );
    }

    #[test]
    fn test_out_of_order_events_are_ignored() {
        assert_eq!(transition(CircuitState::Open, BreakerEvent::Tripped), None);
        assert_eq!(transition(CircuitState::Closed, BreakerEvent::ResetTimeoutElapsed), None);
        assert_eq!(transition(CircuitState::Closed, BreakerEvent::TrialSucceeded), None);
        assert_eq!(transition(CircuitState::HalfOpen, BreakerEvent::ResetTimeoutElapsed), None);
    }

    #[test]
    fn test_state_serializes_in_screaming_case() {
        assert_eq!(serde_json::to_string(&CircuitState::HalfOpen).unwrap(), "\"HALF_OPEN\"");
        assert_eq!(CircuitState::Open.to_string(), "OPEN");
    }
}
