//! Estate Gate HTTP Server Binary
//!
//! This is the main entry point for the gate console REST API server.
//! It builds the estate API gateway, sets up the HTTP router, and starts
//! serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Run with the in-memory gateway (default)
//! cargo run --bin gate-server
//!
//! # Run against the upstream estate API
//! ESTATE_API_BASE_URL=https://estate.example.com/api ESTATE_API_TOKEN=... \
//!   cargo run --bin gate-server --features "http-gateway"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `GATEWAY_CONFIG`: Path to a `gateway.toml` (otherwise the default
//!   locations are searched, then the environment is used)
//! - `GATEWAY_TYPE`, `ESTATE_API_BASE_URL`, `ESTATE_API_TOKEN`,
//!   `ESTATE_API_TIMEOUT_SECS`: gateway selection without a config file
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use estate_gate::gateway::{GatewayConfig, GatewayFactory, PassGateway};
use estate_gate::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting estate gate console server");

    let gateway = build_gateway()?;
    match gateway.health_check().await {
        Ok(true) => info!("Gateway reachable"),
        Ok(false) => warn!("Gateway did not answer the health check"),
        Err(e) => warn!("Gateway health check failed: {}", e),
    }

    // Create application state
    let state = AppState::new(gateway);

    // Create router with all endpoints
    let app = create_router(state);

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `GATEWAY_CONFIG` first, then a `gateway.toml` in the default locations,
/// then the environment.
fn build_gateway() -> anyhow::Result<Arc<dyn PassGateway>> {
    if let Ok(path) = env::var("GATEWAY_CONFIG") {
        info!("Loading gateway configuration from {}", path);
        return Ok(GatewayFactory::from_config_file(&path)?);
    }

    match GatewayConfig::from_default_location() {
        Ok(config) => {
            info!("Using gateway.toml ({:?} gateway)", config.gateway_type());
            Ok(GatewayFactory::from_gateway_config(&config)?)
        }
        Err(_) => {
            info!("No gateway.toml found, configuring gateway from environment");
            Ok(GatewayFactory::from_env()?)
        }
    }
}
