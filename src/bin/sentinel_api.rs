//! Chain Sentinel API Server
//!
//! REST API for contract and wallet risk scans
//!
//! Usage:
//!   cargo run --bin sentinel_api
//!
//! Environment:
//!   PORT / SENTINEL_PORT - Server port (default: 8080)
//!   SENTINEL_HOST        - Server host (default: 0.0.0.0)
//!   OPENAI_API_KEY       - Inference endpoint key (optional)
//!   RUST_LOG             - Log filter (default: info)

use chain_sentinel::api::{create_router, AppState};
use chain_sentinel::{build_pipeline, SentinelConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = SentinelConfig::from_env();
    info!("🌐 {} networks configured", config.networks.len());

    let pipeline = Arc::new(build_pipeline(config));
    let state = Arc::new(AppState::new(pipeline));
    let shutdown = state.shutdown.clone();
    let cache_report = state.clone();

    let app = create_router(state);

    let host = std::env::var("SENTINEL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("SENTINEL_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🚀 Chain Sentinel API starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /v1/health                     - Health check");
    info!("  GET  /v1/networks                   - Configured networks");
    info!("  GET  /v1/networks/:chain_id/status  - Live network status");
    info!("  POST /v1/scan/contract              - Contract risk scan");
    info!("  POST /v1/scan/wallet                - Wallet risk scan");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received, cancelling in-flight scans...");
        shutdown.cancel();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    let stats = cache_report.manager().cache_stats();
    info!(
        "📊 Connection cache: {} entries, {} hits, {} misses ({:.1}% hit rate)",
        stats.entries, stats.hits, stats.misses, stats.hit_rate
    );
    info!("👋 Chain Sentinel API shutdown complete");

    Ok(())
}
