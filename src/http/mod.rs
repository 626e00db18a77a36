//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs
//!         /api/data       → CallOrchestrator::handle_request
//!         /api/rate-limit → limiter usage
//!         /api/circuit    → breaker stats
//!         /health         → breaker snapshot
//!     → response.rs (BoundaryResponse → status + JSON)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
