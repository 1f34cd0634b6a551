//! Scoring Pipeline - contract and wallet risk scans
//!
//! Contract scan:
//! 1. Resolve network, acquire a verified handle (one forced retry)
//! 2. Re-verify chain id on the handle
//! 3. Local pattern checks
//! 4. Rate-limited AI analysis (failure → maximally cautious placeholder)
//! 5. Weighted combination + remediation hints
//!
//! Wallet scan validates the address before any network activity, then
//! combines an interaction heuristic with AI transaction analysis.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::core::ai_analysis::{AiAnalyzer, AiAssessment};
use crate::core::connection::{ConnectionHandle, ConnectionManager};
use crate::core::heuristics::{InteractionHeuristic, NoSignalHeuristic};
use crate::core::risk_score::{
    clamp_unit, combine_contract_score, combine_wallet_score, remediation_hints, WalletWeights,
    CONTRACT_AI_FALLBACK_SCORE, WALLET_AI_FALLBACK_SCORE,
};
use crate::core::static_checks::run_local_checks;
use crate::models::errors::{AppError, AppResult, ErrorCategory};
use crate::models::types::{Finding, FindingKind, ScanSubject, ScoreResult, Severity};
use crate::providers::transactions::{RpcTransactionSource, TransactionSource};
use crate::utils::validation::validate_address;

pub struct ScoringPipeline {
    manager: Arc<ConnectionManager>,
    analyzer: AiAnalyzer,
    transactions: Arc<dyn TransactionSource>,
    heuristic: Arc<dyn InteractionHeuristic>,
}

impl ScoringPipeline {
    /// Pipeline reading wallet activity over RPC, with the no-signal heuristic
    pub fn new(manager: Arc<ConnectionManager>, analyzer: AiAnalyzer) -> Self {
        let transactions = Arc::new(RpcTransactionSource::new(manager.clone()));
        Self {
            manager,
            analyzer,
            transactions,
            heuristic: Arc::new(NoSignalHeuristic),
        }
    }

    pub fn with_transaction_source(mut self, source: Arc<dyn TransactionSource>) -> Self {
        self.transactions = source;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Arc<dyn InteractionHeuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn analyzer(&self) -> &AiAnalyzer {
        &self.analyzer
    }

    /// Acquire, then on a connection-class failure try once more with a forced refresh.
    /// A chain id mismatch would only repeat, so it is terminal.
    async fn connect(&self, chain_id: u64, cancel: &CancellationToken) -> AppResult<ConnectionHandle> {
        match self.manager.acquire_with_cancel(chain_id, false, cancel).await {
            Ok(handle) => Ok(handle),
            Err(e)
                if matches!(
                    e.category(),
                    ErrorCategory::Configuration | ErrorCategory::Validation | ErrorCategory::Cancelled
                ) =>
            {
                Err(e)
            }
            Err(e) => {
                warn!("🔄 Connection to chain {} failed ({}), forcing refresh", chain_id, e);
                self.manager.acquire_with_cancel(chain_id, true, cancel).await
            }
        }
    }

    /// Score Solidity source for deployment on `chain_id`
    #[instrument(skip(self, source, cancel), fields(bytes = source.len()))]
    pub async fn score_contract(
        &self,
        source: &str,
        chain_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<ScoreResult> {
        let started = Instant::now();
        let network_name = self.manager.profile(chain_id)?.name.clone();

        let handle = self.connect(chain_id, cancel).await?;
        if let Err(e) = handle.verify_chain_id().await {
            self.manager.invalidate(chain_id);
            return Err(e);
        }

        let local = run_local_checks(source);
        let local_score = local.clamped_score();

        let (ai_score, ai_available, ai_findings) =
            match self.analyzer.analyze_contract(source, &network_name, cancel).await {
                Ok(AiAssessment { risk_score, findings }) => (risk_score, true, findings),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!("⚠️ {}; assuming worst case", e);
                    (CONTRACT_AI_FALLBACK_SCORE, false, Vec::new())
                }
            };

        let risk_score = combine_contract_score(ai_score, local.raw_score);
        let recommendations = remediation_hints(&local.findings);
        let mut findings = local.findings;
        findings.extend(ai_findings);

        let result = ScoreResult {
            subject: ScanSubject::Contract,
            chain_id,
            risk_score,
            local_score,
            ai_score,
            ai_available,
            findings,
            recommendations,
        };

        info!(
            "{} Contract on {}: score {:.2} ({}) in {}ms",
            result.risk_level().emoji(),
            network_name,
            result.risk_score,
            result.risk_level().as_str(),
            started.elapsed().as_millis()
        );
        Ok(result)
    }

    /// Score a wallet from its recent activity on `chain_id`
    #[instrument(skip(self, weights, cancel))]
    pub async fn score_wallet(
        &self,
        address: &str,
        chain_id: u64,
        weights: Option<WalletWeights>,
        cancel: &CancellationToken,
    ) -> AppResult<ScoreResult> {
        let started = Instant::now();
        validate_address(address)?;
        let address = address.trim();
        let network_name = self.manager.profile(chain_id)?.name.clone();
        if cancel.is_cancelled() {
            return Err(AppError::cancelled("Wallet scan"));
        }

        let transactions = match self
            .transactions
            .recent_transactions(address, chain_id, cancel)
            .await
        {
            Ok(txs) => txs,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!("⚠️ Could not load transactions for {}: {}", address, e);
                Vec::new()
            }
        };

        let heuristic_score = clamp_unit(self.heuristic.score(address, &transactions));
        let mut findings = Vec::new();
        if heuristic_score > 0.0 {
            findings.push(Finding::new(
                FindingKind::SuspiciousInteraction,
                Severity::from_score(heuristic_score),
                format!(
                    "Suspicious contract interactions detected ({} heuristic, score {:.2})",
                    self.heuristic.name(),
                    heuristic_score
                ),
            ));
        }

        let (ai_score, ai_available) = match self
            .analyzer
            .analyze_transactions(&transactions, &network_name, cancel)
            .await
        {
            Ok(AiAssessment {
                risk_score,
                findings: patterns,
            }) => {
                findings.extend(patterns);
                (risk_score, true)
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!("⚠️ {}; using moderate default", e);
                (WALLET_AI_FALLBACK_SCORE, false)
            }
        };

        let risk_score =
            combine_wallet_score(heuristic_score, ai_score, weights.unwrap_or_default());
        let recommendations = remediation_hints(&findings);

        let result = ScoreResult {
            subject: ScanSubject::Wallet {
                address: address.to_string(),
            },
            chain_id,
            risk_score,
            local_score: heuristic_score,
            ai_score,
            ai_available,
            findings,
            recommendations,
        };

        info!(
            "{} Wallet {} on {}: score {:.2} ({} txs) in {}ms",
            result.risk_level().emoji(),
            address,
            network_name,
            result.risk_score,
            transactions.len(),
            started.elapsed().as_millis()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{NetworkProfile, NetworkRegistry, RateLimitConfig};
    use crate::models::errors::ErrorCode;
    use crate::providers::inference::UnconfiguredInference;
    use crate::providers::transactions::StaticTransactionSource;
    use std::time::Duration;

    struct FixedHeuristic(f64);

    impl InteractionHeuristic for FixedHeuristic {
        fn score(&self, _address: &str, _transactions: &[crate::models::types::TransactionSummary]) -> f64 {
            self.0
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn pipeline() -> ScoringPipeline {
        let registry = NetworkRegistry::new([NetworkProfile::builtin(1).unwrap()]);
        let manager = Arc::new(ConnectionManager::new(Arc::new(registry)));
        let analyzer = AiAnalyzer::new(
            Arc::new(UnconfiguredInference),
            RateLimitConfig {
                max_requests: 50,
                window: Duration::from_secs(60),
            },
        );
        ScoringPipeline::new(manager, analyzer)
            .with_transaction_source(Arc::new(StaticTransactionSource::default()))
    }

    #[tokio::test]
    async fn test_wallet_ai_failure_uses_moderate_default() {
        let token = CancellationToken::new();
        let result = pipeline()
            .score_wallet("0xd8da6bf26964af9d7eed9e03e53415d37aa96045", 1, None, &token)
            .await
            .unwrap();
        assert!((result.risk_score - 0.3).abs() < 1e-9);
        assert!(!result.ai_available);
        assert!(result.findings.is_empty());
    }

    #[tokio::test]
    async fn test_wallet_positive_heuristic_reports_finding() {
        let token = CancellationToken::new();
        let result = pipeline()
            .with_heuristic(Arc::new(FixedHeuristic(0.5)))
            .score_wallet("0xd8da6bf26964af9d7eed9e03e53415d37aa96045", 1, None, &token)
            .await
            .unwrap();
        // 0.4 * 0.5 + 0.6 * 0.5
        assert!((result.risk_score - 0.5).abs() < 1e-9);
        assert_eq!(result.findings[0].kind, FindingKind::SuspiciousInteraction);
        assert_eq!(result.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_address_rejected_first() {
        let token = CancellationToken::new();
        let err = pipeline()
            .score_wallet("not-an-address", 999, None, &token)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);
    }

    #[tokio::test]
    async fn test_unknown_network_rejected() {
        let token = CancellationToken::new();
        let err = pipeline()
            .score_wallet("0xd8da6bf26964af9d7eed9e03e53415d37aa96045", 999, None, &token)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigUnsupportedChain);

        let err = pipeline().score_contract("contract A {}", 999, &token).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigUnsupportedChain);
    }
}
