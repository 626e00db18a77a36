//! Rolling statistics window.
//!
//! The window is split into `bucket_count` equal buckets kept in a ring.
//! A bucket is identified by its absolute index (elapsed / bucket width);
//! when a slot is reused for a newer index its counts are cleared first, so
//! stale buckets never leak into the totals.

use std::time::Duration;

use serde::Serialize;

use crate::resilience::clock::Instant;

const EMPTY: u64 = u64::MAX;

/// Upper bound on buckets per window; larger counts are clamped.
pub const MAX_BUCKETS: usize = 1000;

/// Counters kept per bucket and summed over the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowCounts {
    pub fires: u64,
    pub successes: u64,
    pub failures: u64,
    pub rejections: u64,
    /// Subset of `failures` caused by the call timeout.
    pub timeouts: u64,
}

impl WindowCounts {
    /// Executed calls, the denominator of the error rate.
    pub fn calls(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn error_percentage(&self) -> f64 {
        match self.calls() {
            0 => 0.0,
            calls => self.failures as f64 * 100.0 / calls as f64,
        }
    }

    fn merge(&mut self, other: &WindowCounts) {
        self.fires += other.fires;
        self.successes += other.successes;
        self.failures += other.failures;
        self.rejections += other.rejections;
        self.timeouts += other.timeouts;
    }
}

/// What happened to one call, from the window's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Fire,
    Success,
    Failure,
    Timeout,
    Rejection,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    index: u64,
    counts: WindowCounts,
}

impl Bucket {
    const fn empty() -> Self {
        Self {
            index: EMPTY,
            counts: WindowCounts {
                fires: 0,
                successes: 0,
                failures: 0,
                rejections: 0,
                timeouts: 0,
            },
        }
    }
}

/// Ring buffer of time buckets.
#[derive(Debug)]
pub struct RollingWindow {
    origin: Instant,
    bucket_width: Duration,
    buckets: Vec<Bucket>,
}

impl RollingWindow {
    pub fn new(window: Duration, bucket_count: usize, origin: Instant) -> Self {
        let bucket_count = bucket_count.clamp(1, MAX_BUCKETS);
        let divisor = u32::try_from(bucket_count).unwrap_or(u32::MAX);
        let bucket_width = (window / divisor).max(Duration::from_nanos(1));
        Self {
            origin,
            bucket_width,
            buckets: vec![Bucket::empty(); bucket_count],
        }
    }

    fn index_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.origin).as_nanos();
        (elapsed / self.bucket_width.as_nanos()) as u64
    }

    pub fn record(&mut self, now: Instant, sample: Sample) {
        let index = self.index_at(now);
        let slot = (index % self.buckets.len() as u64) as usize;
        let bucket = &mut self.buckets[slot];
        if bucket.index != index {
            *bucket = Bucket {
                index,
                counts: WindowCounts::default(),
            };
        }

        let counts = &mut bucket.counts;
        match sample {
            Sample::Fire => counts.fires += 1,
            Sample::Success => counts.successes += 1,
            Sample::Failure => counts.failures += 1,
            Sample::Timeout => {
                counts.failures += 1;
                counts.timeouts += 1;
            }
            Sample::Rejection => counts.rejections += 1,
        }
    }

    /// Sum of all buckets still inside the window at `now`.
    pub fn totals(&self, now: Instant) -> WindowCounts {
        let current = self.index_at(now);
        let span = self.buckets.len() as u64;

        let mut totals = WindowCounts::default();
        for bucket in &self.buckets {
            if bucket.index != EMPTY && bucket.index <= current && current - bucket.index < span {
                totals.merge(&bucket.counts);
            }
        }
        totals
    }

    /// Drop every bucket.
    pub fn reset(&mut self) {
        self.buckets.fill(Bucket::empty());
    }
}
