//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, timeouts, bucket layout)
//! - Check cross-field consistency (request timeout covers call timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::resilience::circuit_breaker::window::MAX_BUCKETS;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint and collect all violations.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.downstream.url.trim().is_empty() {
        errors.push(ValidationError::new("downstream.url", "must not be empty"));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be at least 1"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be at least 1"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }

    let cb = &config.circuit_breaker;
    if cb.call_timeout_ms == 0 {
        errors.push(ValidationError::new("circuit_breaker.call_timeout_ms", "must be greater than 0"));
    }
    if cb.reset_timeout_ms == 0 {
        errors.push(ValidationError::new("circuit_breaker.reset_timeout_ms", "must be greater than 0"));
    }
    if !(1..=100).contains(&cb.error_threshold_percentage) {
        errors.push(ValidationError::new(
            "circuit_breaker.error_threshold_percentage",
            format!("must be within 1..=100, got {}", cb.error_threshold_percentage),
        ));
    }
    if cb.volume_threshold == 0 {
        errors.push(ValidationError::new("circuit_breaker.volume_threshold", "must be at least 1"));
    }
    if cb.bucket_count == 0 {
        errors.push(ValidationError::new("circuit_breaker.bucket_count", "must be at least 1"));
    } else if cb.bucket_count > MAX_BUCKETS {
        errors.push(ValidationError::new(
            "circuit_breaker.bucket_count",
            format!("must be at most {MAX_BUCKETS}, got {}", cb.bucket_count),
        ));
    } else if cb.rolling_window_ms == 0 || cb.rolling_window_ms % cb.bucket_count as u64 != 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.rolling_window_ms",
            format!(
                "must be a non-zero multiple of bucket_count ({}), got {}",
                cb.bucket_count, cb.rolling_window_ms
            ),
        ));
    }

    if config.timeouts.request_secs.saturating_mul(1000) < cb.call_timeout_ms {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be at least as long as circuit_breaker.call_timeout_ms",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
