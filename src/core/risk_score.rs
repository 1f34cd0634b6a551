//! Risk Scoring Module
//! Weighted combination of local and AI signals into one 0-1 score
//!
//! The weights below are tunable policy, not derived invariants. Contract
//! and wallet scans deliberately use different splits.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::types::{Finding, FindingKind};

/// Contract scans: 60% AI, 40% local checks
pub const CONTRACT_AI_WEIGHT: f64 = 0.6;
pub const CONTRACT_LOCAL_WEIGHT: f64 = 0.4;

/// Wallet scans: 40% interaction heuristic, 60% AI
pub const WALLET_HEURISTIC_WEIGHT: f64 = 0.4;
pub const WALLET_AI_WEIGHT: f64 = 0.6;

/// AI contribution when contract analysis fails (maximally cautious)
pub const CONTRACT_AI_FALLBACK_SCORE: f64 = 1.0;
/// AI contribution when transaction analysis fails (moderate)
pub const WALLET_AI_FALLBACK_SCORE: f64 = 0.5;
/// Returned when a weighted combination cannot be computed
pub const COMBINATION_FAILURE_SCORE: f64 = 0.7;

/// Clamp to [0, 1]; NaN collapses to 0
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// `0.6 * ai + 0.4 * min(local, 1)`, clamped
pub fn combine_contract_score(ai_score: f64, local_subtotal: f64) -> f64 {
    clamp_unit(
        CONTRACT_AI_WEIGHT * clamp_unit(ai_score)
            + CONTRACT_LOCAL_WEIGHT * clamp_unit(local_subtotal),
    )
}

/// Caller-overridable weights for wallet scoring. They need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalletWeights {
    #[serde(alias = "code_analysis")]
    pub heuristic: f64,
    #[serde(alias = "transaction_analysis")]
    pub ai: f64,
}

impl Default for WalletWeights {
    fn default() -> Self {
        Self {
            heuristic: WALLET_HEURISTIC_WEIGHT,
            ai: WALLET_AI_WEIGHT,
        }
    }
}

/// Weighted wallet score, clamped. Non-finite weights or results degrade to
/// `COMBINATION_FAILURE_SCORE` instead of failing the scan.
pub fn combine_wallet_score(heuristic_score: f64, ai_score: f64, weights: WalletWeights) -> f64 {
    let combined = heuristic_score * weights.heuristic + ai_score * weights.ai;
    if !weights.heuristic.is_finite() || !weights.ai.is_finite() || !combined.is_finite() {
        return COMBINATION_FAILURE_SCORE;
    }
    clamp_unit(combined)
}

/// Fixed remediation text per local finding kind
pub fn remediation_for(kind: FindingKind) -> Option<&'static str> {
    match kind {
        FindingKind::Reentrancy => {
            Some("Implement ReentrancyGuard or checks-effects-interactions pattern")
        }
        FindingKind::UncheckedExternalCall => {
            Some("Add require() statements to check return values")
        }
        FindingKind::MissingOverflowGuard => {
            Some("Use SafeMath library for arithmetic operations")
        }
        FindingKind::UnsafeOriginCheck => Some("Replace tx.origin with msg.sender"),
        FindingKind::SuspiciousInteraction => {
            Some("Review recent contract interactions and revoke unneeded token approvals")
        }
        FindingKind::AiReported => None,
    }
}

/// One hint per distinct local finding kind, in first-appearance order.
/// AI-reported findings never produce hints.
pub fn remediation_hints(findings: &[Finding]) -> Vec<String> {
    let mut seen = HashSet::new();
    findings
        .iter()
        .filter(|f| f.kind.is_local() && seen.insert(f.kind))
        .filter_map(|f| remediation_for(f.kind))
        .map(String::from)
        .collect()
}
