//! Time source shared by the limiter, retry executor and breaker.
//!
//! Everything reads Tokio's monotonic clock, so window arithmetic, retry
//! delays, call timeouts and the reset timer all move together when the
//! runtime clock is paused in tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use tokio::time::Instant;

/// Current monotonic instant.
pub fn now() -> Instant {
    Instant::now()
}

/// Milliseconds since the Unix epoch, for response bodies.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Project a monotonic instant onto wall-clock milliseconds.
pub fn to_unix_millis(instant: Instant) -> u64 {
    let wall = unix_millis();
    let current = now();
    if instant >= current {
        wall.saturating_add((instant - current).as_millis() as u64)
    } else {
        wall.saturating_sub((current - instant).as_millis() as u64)
    }
}

/// Round up to whole seconds, the granularity `retry_after` is reported in.
pub fn ceil_secs(duration: Duration) -> Duration {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    Duration::from_secs(secs)
}
