//! Resilient outbound-call gateway.
//!
//! Guards a single downstream dependency with a sliding-window rate limiter,
//! a bounded retry loop and a rolling-window circuit breaker, serving a
//! fallback payload whenever the downstream cannot be used.

pub mod config;
pub mod downstream;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orchestrator::{BoundaryResponse, CallOrchestrator};
