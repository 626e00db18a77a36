//! Flaky downstream for exercising the gateway by hand.
//!
//! Serves `GET /data`, failing a configurable share of requests with 500 and
//! sleeping a random latency before each answer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Parser, Clone)]
#[command(name = "downstream-stub")]
#[command(about = "Unreliable downstream service for gateway testing", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1:3001")]
    bind: String,

    /// Share of requests answered with 500, between 0.0 and 1.0.
    #[arg(short, long, default_value_t = 0.3)]
    failure_ratio: f64,

    /// Upper bound of the random latency added to each request.
    #[arg(short, long, default_value_t = 200)]
    max_latency_ms: u64,
}

struct StubState {
    args: Args,
    served: AtomicU64,
}

async fn data(State(state): State<Arc<StubState>>) -> (StatusCode, Json<Value>) {
    let latency = fastrand::u64(0..=state.args.max_latency_ms);
    tokio::time::sleep(Duration::from_millis(latency)).await;

    let n = state.served.fetch_add(1, Ordering::Relaxed) + 1;
    if fastrand::f64() < state.args.failure_ratio {
        tracing::warn!(request = n, latency_ms = latency, "Injected failure");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "injected failure" })),
        );
    }

    tracing::info!(request = n, latency_ms = latency, "Served data");
    (
        StatusCode::OK,
        Json(json!({
            "id": n,
            "value": fastrand::u32(..),
            "latencyMs": latency,
        })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "downstream_stub=info".into()),
        )
        .init();

    let listener = TcpListener::bind(&args.bind).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        failure_ratio = args.failure_ratio,
        max_latency_ms = args.max_latency_ms,
        "Downstream stub listening"
    );

    let state = Arc::new(StubState {
        args,
        served: AtomicU64::new(0),
    });
    let app = Router::new().route("/data", get(data)).with_state(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
