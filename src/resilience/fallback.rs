//! Placeholder payload served when the downstream cannot be used.

use serde::Serialize;

use crate::resilience::clock;

pub const FALLBACK_MESSAGE: &str = "Service temporarily unavailable. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackStatus {
    Fallback,
}

/// Static "service unavailable" body, stamped with the time it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackPayload {
    pub message: &'static str,
    pub status: FallbackStatus,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Build the fallback payload for a given wall-clock time.
pub fn fallback_at(timestamp: u64) -> FallbackPayload {
    FallbackPayload {
        message: FALLBACK_MESSAGE,
        status: FallbackStatus::Fallback,
        timestamp,
    }
}

/// Build the fallback payload stamped with the current time.
pub fn fallback() -> FallbackPayload {
    fallback_at(clock::unix_millis())
}
