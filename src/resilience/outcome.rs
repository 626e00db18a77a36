//! Result of one guarded invocation.

use crate::error::{FailureKind, RejectReason};

/// What a single trip through the limiter and breaker produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    /// The downstream answered.
    Success(T),
    /// The call ran and failed (counted by the breaker).
    Failure(FailureKind),
    /// The call never ran.
    Rejected(RejectReason),
}

impl<T> CallOutcome<T> {
    /// Label used for request metrics.
    pub fn label(&self) -> &'static str {
        match self {
            CallOutcome::Success(_) => "success",
            CallOutcome::Failure(kind) => kind.as_str(),
            CallOutcome::Rejected(reason) => reason.as_str(),
        }
    }
}
