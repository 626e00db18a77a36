//! Route handlers.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::resilience::circuit_breaker::{BreakerStats, CircuitState};
use crate::resilience::rate_limit::RateLimitUsage;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub circuit: BreakerStats,
}

/// The guarded downstream call.
pub async fn guarded_call(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request_id = request_id(&headers);
    tracing::debug!(request_id = %request_id, "Handling guarded call");

    let response = state.orchestrator.handle_request().await;

    tracing::debug!(
        request_id = %request_id,
        status = response.status_code(),
        "Guarded call finished"
    );
    response.into_response()
}

pub async fn rate_limit_status(State(state): State<AppState>) -> Json<RateLimitUsage> {
    Json(state.orchestrator.rate_limit_usage())
}

pub async fn circuit_status(State(state): State<AppState>) -> Json<BreakerStats> {
    Json(state.orchestrator.breaker_stats())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let circuit = state.orchestrator.breaker_stats();
    let status = match circuit.state {
        CircuitState::Closed => "ok",
        CircuitState::HalfOpen | CircuitState::Open => "degraded",
    };

    Json(HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION"),
        circuit,
    })
}
