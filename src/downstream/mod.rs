//! Downstream collaborator.
//!
//! # Responsibilities
//! - Perform exactly one idempotent GET per attempt
//! - Decode the JSON payload or report why the attempt failed
//!
//! # Design Decisions
//! - No retries or timeouts beyond the TCP connect timeout here; the retry
//!   executor and breaker own both
//! - Non-2xx responses are attempt failures, same as connection errors

pub mod http;

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

pub use http::HttpDownstream;

/// Structured payload returned by the downstream.
pub type Payload = Value;

/// Why a single attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("downstream responded with status {0}")]
    Status(u16),
}

/// A single-shot call to the protected dependency.
pub trait Downstream: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Payload, DownstreamError>> + Send;
}

impl<D: Downstream> Downstream for Arc<D> {
    fn fetch(&self) -> impl Future<Output = Result<Payload, DownstreamError>> + Send {
        (**self).fetch()
    }
}
