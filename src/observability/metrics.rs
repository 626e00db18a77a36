//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by outcome, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_rate_limited_total` (counter): requests refused by the limiter
//! - `gateway_retry_attempts_total` (counter): downstream attempts by result
//! - `gateway_breaker_rejections_total` (counter): short-circuits by reason
//! - `gateway_breaker_transitions_total` (counter): state changes by from/to
//! - `gateway_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder (tests, metrics disabled) every call is a no-op
//! - Prometheus exposition via its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::{Transition, TransitionObserver};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_retry_attempt(result: &'static str) {
    counter!("gateway_retry_attempts_total", "result" => result).increment(1);
}

pub fn record_breaker_rejection(reason: &'static str) {
    counter!("gateway_breaker_rejections_total", "reason" => reason).increment(1);
}

/// Feeds breaker transitions into the transition counter and state gauge.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl TransitionObserver for MetricsObserver {
    fn on_transition(&self, transition: &Transition) {
        counter!(
            "gateway_breaker_transitions_total",
            "from" => transition.from.as_str(),
            "to" => transition.to.as_str()
        )
        .increment(1);
        gauge!("gateway_breaker_state").set(transition.to.as_gauge());
    }
}
