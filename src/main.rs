//! Circuit gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                  CIRCUIT GATEWAY                   │
//!                    │                                                    │
//!  GET /api/data     │  ┌────────────┐   ┌─────────────────────────────┐ │
//!  ──────────────────┼─▶│ rate limit │──▶│ circuit breaker             │ │
//!                    │  │ (sliding)  │   │  ┌───────────────────────┐  │ │
//!                    │  └─────┬──────┘   │  │ retries (fixed delay) │──┼─┼──▶ Downstream
//!                    │        │ 429      │  └───────────────────────┘  │ │
//!                    │        ▼          └──────────────┬──────────────┘ │
//!  ◀─────────────────┼── response ◀── fallback (503) ◀─┘                │
//!                    └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use circuit_gateway::config::{load_config, validation::validate_config, GatewayConfig};
use circuit_gateway::observability::{logging, metrics};
use circuit_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "circuit-gateway")]
#[command(about = "Rate-limited, retrying, circuit-broken gateway for one downstream", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let config = GatewayConfig::default();
            validate_config(&config).map_err(|errors| {
                errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            })?;
            config
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("circuit-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        downstream = %config.downstream.url,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        max_attempts = config.retries.max_attempts,
        call_timeout_ms = config.circuit_breaker.call_timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
