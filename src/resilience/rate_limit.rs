//! Sliding-window admission gate.
//!
//! # Algorithm
//! ```text
//! admit(now):
//!     prune timestamps with now - ts >= window
//!     remaining >= max_requests → reject, retry_after = window - (now - oldest)
//!     otherwise                 → push now, admit
//! ```
//!
//! # Design Decisions
//! - History is pruned lazily on every check, never by a background task
//! - Bursts up to `max_requests` are admitted instantly; there is no refill rate
//! - One mutex serializes prune + append so concurrent checks never lose an entry

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

use crate::config::RateLimitConfig;
use crate::resilience::clock::{ceil_secs, Instant};

/// Result of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// Set only on rejection; always at least one second.
    pub retry_after: Option<Duration>,
}

impl Admission {
    fn allowed() -> Self {
        Self {
            allowed: true,
            retry_after: None,
        }
    }

    fn rejected(retry_after: Duration) -> Self {
        Self {
            allowed: false,
            retry_after: Some(retry_after),
        }
    }
}

/// Read-only view of the limiter for status endpoints.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RateLimitUsage {
    pub limit: usize,
    pub used: usize,
    pub remaining: usize,
    pub window_secs: u64,
    /// Seconds until the oldest admission leaves the window.
    pub reset_after_secs: u64,
}

/// Fixed-capacity limiter over a sliding window of admission instants.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    accepted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            accepted: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window(), config.max_requests)
    }

    /// Decide whether a request arriving at `now` may proceed.
    pub fn admit(&self, now: Instant) -> Admission {
        let mut accepted = self
            .accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        while let Some(&oldest) = accepted.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                accepted.pop_front();
            } else {
                break;
            }
        }

        if accepted.len() >= self.max_requests {
            // Non-empty here since max_requests >= 1.
            let oldest = accepted.front().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.saturating_duration_since(oldest));
            return Admission::rejected(ceil_secs(retry_after).max(Duration::from_secs(1)));
        }

        accepted.push_back(now);
        Admission::allowed()
    }

    /// Current usage as seen at `now`, without pruning or admitting.
    pub fn usage(&self, now: Instant) -> RateLimitUsage {
        let accepted = self
            .accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let live: Vec<Instant> = accepted
            .iter()
            .copied()
            .filter(|ts| now.saturating_duration_since(*ts) < self.window)
            .collect();

        let reset_after = live
            .first()
            .map(|oldest| ceil_secs(self.window.saturating_sub(now.saturating_duration_since(*oldest))))
            .unwrap_or_default();

        RateLimitUsage {
            limit: self.max_requests,
            used: live.len(),
            remaining: self.max_requests.saturating_sub(live.len()),
            window_secs: self.window.as_secs(),
            reset_after_secs: reset_after.as_secs(),
        }
    }

    /// Number of timestamps currently stored (expired ones included until the next check).
    pub fn history_len(&self) -> usize {
        self.accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(60), 5)
    }

    #[test]
    fn test_burst_up_to_capacity_then_reject() {
        let limiter = limiter();
        let start = Instant::now();

        for i in 0..5 {
            let admission = limiter.admit(start + Duration::from_secs(i));
            assert!(admission.allowed, "request {} should be admitted", i);
            assert_eq!(admission.retry_after, None);
        }

        let sixth = limiter.admit(start + Duration::from_secs(10));
        assert!(!sixth.allowed);
        // Oldest entry (t=0) leaves the window at t=60.
        assert_eq!(sixth.retry_after, Some(Duration::from_secs(50)));
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let start = Instant::now();

        assert!(limiter.admit(start).allowed);
        let rejected = limiter.admit(start + Duration::from_millis(59_500));
        assert_eq!(rejected.retry_after, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_rejection_does_not_extend_history() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let start = Instant::now();

        limiter.admit(start);
        limiter.admit(start);
        for _ in 0..10 {
            assert!(!limiter.admit(start + Duration::from_secs(1)).allowed);
        }
        assert_eq!(limiter.history_len(), 2);
    }

    #[test]
    fn test_fresh_burst_after_window_elapses() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.admit(start).allowed);
        }
        assert!(!limiter.admit(start + Duration::from_secs(59)).allowed);

        let later = start + Duration::from_secs(60);
        for _ in 0..5 {
            assert!(limiter.admit(later).allowed);
        }
        // Old entries were pruned on the first check past the window.
        assert_eq!(limiter.history_len(), 5);
        assert!(!limiter.admit(later).allowed);
    }

    #[test]
    fn test_entries_expire_individually() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 2);
        let start = Instant::now();

        assert!(limiter.admit(start).allowed);
        assert!(limiter.admit(start + Duration::from_secs(5)).allowed);
        assert!(!limiter.admit(start + Duration::from_secs(9)).allowed);

        // Only the first entry has expired at t=10.
        assert!(limiter.admit(start + Duration::from_secs(10)).allowed);
        let rejected = limiter.admit(start + Duration::from_secs(11));
        assert_eq!(rejected.retry_after, Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_usage_is_read_only() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.admit(start);
        limiter.admit(start + Duration::from_secs(30));

        let usage = limiter.usage(start + Duration::from_secs(45));
        assert_eq!(usage.used, 2);
        assert_eq!(usage.remaining, 3);
        assert_eq!(usage.reset_after_secs, 15);

        let usage = limiter.usage(start + Duration::from_secs(61));
        assert_eq!(usage.used, 1);
        assert_eq!(usage.remaining, 4);
        assert_eq!(limiter.history_len(), 2, "usage must not prune");
    }

    #[test]
    fn test_concurrent_admissions_respect_capacity() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60), 50));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..20).filter(|_| limiter.admit(now).allowed).count())
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
        assert_eq!(limiter.history_len(), 50);
    }
}
