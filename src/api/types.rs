//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::report::ScanReport;
use crate::core::risk_score::WalletWeights;
use crate::models::config::NetworkProfile;
use crate::models::errors::AppError;
use crate::models::types::ScoreResult;
use crate::providers::rpc::mask_url;
use crate::utils::cache::CacheStats;
use crate::utils::constants::CHAIN_ID_ETHEREUM;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub category: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            category: err.category().as_str().to_string(),
            message: err.message.clone(),
            retryable: err.is_retryable(),
        }
    }
}

fn default_chain_id() -> u64 {
    CHAIN_ID_ETHEREUM
}

// ============================================
// Contract Scan
// ============================================

#[derive(Debug, Deserialize)]
pub struct ContractScanRequest {
    /// Original upload name; must end in .sol or .txt
    pub filename: String,
    pub source: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

#[derive(Debug, Serialize)]
pub struct ContractScanData {
    pub filename: String,
    pub network: String,
    pub result: ScoreResult,
    pub report: ScanReport,
}

// ============================================
// Wallet Scan
// ============================================

#[derive(Debug, Deserialize)]
pub struct WalletScanRequest {
    pub address: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default)]
    pub weights: Option<WalletWeights>,
}

#[derive(Debug, Serialize)]
pub struct WalletScanData {
    pub address: String,
    pub network: String,
    pub result: ScoreResult,
    pub report: ScanReport,
}

// ============================================
// Networks
// ============================================

#[derive(Debug, Serialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub name: String,
    pub is_testnet: bool,
    pub currency_symbol: String,
    pub explorer_url: String,
    /// Endpoints, keys hidden
    pub rpc_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_endpoint: Option<String>,
}

impl NetworkInfo {
    pub fn new(profile: &NetworkProfile, cached_endpoint: Option<String>) -> Self {
        Self {
            chain_id: profile.chain_id,
            name: profile.name.clone(),
            is_testnet: profile.is_testnet,
            currency_symbol: profile.currency_symbol.clone(),
            explorer_url: profile.explorer_url.clone(),
            rpc_urls: profile.rpc_urls.iter().map(|u| mask_url(u)).collect(),
            cached_endpoint: cached_endpoint.as_deref().map(mask_url),
        }
    }
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub networks: usize,
    pub inference_provider: String,
    pub connection_cache: CacheStats,
}
