//! API Route Configuration

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::logging_middleware;
use crate::utils::constants::MAX_UPLOAD_BYTES;

/// Headroom for the JSON envelope around an uploaded source file
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/networks", get(handlers::list_networks))
        .route("/networks/:chain_id/status", get(handlers::network_status))
        .route("/scan/contract", post(handlers::scan_contract))
        .route("/scan/wallet", post(handlers::scan_wallet));

    Router::new()
        .nest("/v1", api_v1)
        .route("/health", get(handlers::health_check))
        .fallback(handlers::not_found)
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_OVERHEAD_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
}
