//! Response rendering.
//!
//! # Responsibilities
//! - Turn a `BoundaryResponse` into an HTTP response
//! - Add `Retry-After` on rate-limit rejections
//!
//! # Design Decisions
//! - Successful calls return the downstream payload untouched
//! - Every failure path still returns a JSON body

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::orchestrator::BoundaryResponse;

impl IntoResponse for BoundaryResponse {
    fn into_response(self) -> Response {
        match self {
            BoundaryResponse::Success(payload) => (StatusCode::OK, Json(payload)).into_response(),
            BoundaryResponse::RateLimited(body) => {
                let retry_after = HeaderValue::from(body.retry_after);
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response.headers_mut().insert(header::RETRY_AFTER, retry_after);
                response
            }
            BoundaryResponse::Unavailable(body) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
            }
        }
    }
}
