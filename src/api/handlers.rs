//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{StatusCode, Uri},
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::types::*;
use crate::core::connection::ConnectionManager;
use crate::core::report::ScanReport;
use crate::core::scanner::ScoringPipeline;
use crate::models::errors::AppError;
use crate::models::types::StatusReport;
use crate::utils::constants::APP_VERSION;
use crate::utils::validation::validate_upload;

type ApiFailure = (StatusCode, Json<ApiResponse<()>>);

/// Shared application state
pub struct AppState {
    pub pipeline: Arc<ScoringPipeline>,
    pub start_time: Instant,
    /// Cancelled on shutdown; each request runs under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pipeline: Arc<ScoringPipeline>) -> Self {
        Self {
            pipeline,
            start_time: Instant::now(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        self.pipeline.manager()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn failure(err: &AppError, start: Instant) -> ApiFailure {
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), elapsed_ms(start))),
    )
}

/// Unwrap a JSON body, reporting malformed payloads in the usual envelope
fn parse_body<T>(payload: Result<Json<T>, JsonRejection>, start: Instant) -> Result<T, ApiFailure> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| failure(&AppError::bad_request(rejection.body_text()), start))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiFailure {
    failure(&AppError::route_not_found(uri.path()), Instant::now())
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
        networks: state.manager().registry().len(),
        inference_provider: state.pipeline.analyzer().provider_name().to_string(),
        connection_cache: state.manager().cache_stats(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Networks
// ============================================

pub async fn list_networks(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<NetworkInfo>>> {
    let start = Instant::now();
    let manager = state.manager();

    let networks = manager
        .registry()
        .all()
        .into_iter()
        .map(|profile| NetworkInfo::new(profile, manager.cached_endpoint(profile.chain_id)))
        .collect();

    Json(ApiResponse::success(networks, elapsed_ms(start)))
}

/// Always 200: a failed probe is still a valid report
pub async fn network_status(
    State(state): State<Arc<AppState>>,
    Path(chain_id): Path<u64>,
) -> Json<ApiResponse<StatusReport>> {
    let start = Instant::now();
    let report = state.manager().probe_status(chain_id).await;
    if !report.is_ok() {
        warn!("⚠️ Status probe for chain {} failed", chain_id);
    }
    Json(ApiResponse::success(report, elapsed_ms(start)))
}

// ============================================
// Contract Scan
// ============================================

pub async fn scan_contract(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContractScanRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ContractScanData>>, ApiFailure> {
    let start = Instant::now();
    let req = parse_body(payload, start)?;

    validate_upload(&req.filename, &req.source).map_err(|e| failure(&e, start))?;
    let network = state
        .manager()
        .profile(req.chain_id)
        .map_err(|e| failure(&e, start))?
        .name
        .clone();

    info!("🔍 Scanning contract {} on {}", req.filename, network);

    let cancel = state.shutdown.child_token();
    let result = state
        .pipeline
        .score_contract(&req.source, req.chain_id, &cancel)
        .await
        .map_err(|e| failure(&e, start))?;
    let report = ScanReport::from_result(&result);

    Ok(Json(ApiResponse::success(
        ContractScanData {
            filename: req.filename,
            network,
            result,
            report,
        },
        elapsed_ms(start),
    )))
}

// ============================================
// Wallet Scan
// ============================================

pub async fn scan_wallet(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WalletScanRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<WalletScanData>>, ApiFailure> {
    let start = Instant::now();
    let req = parse_body(payload, start)?;

    let cancel = state.shutdown.child_token();
    let result = state
        .pipeline
        .score_wallet(&req.address, req.chain_id, req.weights, &cancel)
        .await
        .map_err(|e| failure(&e, start))?;

    let network = state
        .manager()
        .profile(req.chain_id)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let report = ScanReport::from_result(&result);

    Ok(Json(ApiResponse::success(
        WalletScanData {
            address: req.address.trim().to_string(),
            network,
            result,
            report,
        },
        elapsed_ms(start),
    )))
}
