//! Chain Sentinel Library
//!
//! Risk scanner for smart contracts and wallets on EVM networks:
//! - Chain-verified RPC connections with ordered fallback and retries
//! - Local pattern checks over Solidity source
//! - Rate-limited AI analysis with conservative fallbacks
//! - Weighted 0-1 risk scoring and remediation hints

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    AiAnalyzer, ConnectionHandle, ConnectionManager, InteractionHeuristic, RateLimiter,
    ScanReport, ScoringPipeline, WalletWeights,
};
pub use models::{
    AppError, AppResult, ErrorCategory, ErrorCode, Finding, FindingKind, NetworkProfile,
    NetworkRegistry, RiskLevel, ScoreResult, SentinelConfig, Severity, StatusReport,
};
pub use providers::{InferenceClient, OpenAiInferenceClient, TransactionSource, UnconfiguredInference};

use std::sync::Arc;
use tracing::warn;

/// Wire a pipeline from configuration. Without an API key the pipeline
/// still runs, with AI contributions replaced by their fallback scores.
pub fn build_pipeline(config: SentinelConfig) -> ScoringPipeline {
    let manager = Arc::new(ConnectionManager::new(Arc::new(config.networks)));
    let client: Arc<dyn InferenceClient> = match OpenAiInferenceClient::new(&config.inference) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("⚠️ {}; AI analysis disabled", e);
            Arc::new(UnconfiguredInference)
        }
    };
    ScoringPipeline::new(manager, AiAnalyzer::new(client, config.rate_limit))
}
