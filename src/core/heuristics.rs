//! Wallet interaction heuristics
//!
//! Extension point for scoring a wallet's recent activity without the AI.
//! The shipped implementation carries no signal.

use crate::models::types::TransactionSummary;

pub trait InteractionHeuristic: Send + Sync {
    /// Score in [0, 1]; anything above 0 is reported as a finding
    fn score(&self, address: &str, transactions: &[TransactionSummary]) -> f64;

    fn name(&self) -> &'static str;
}

/// Always 0.0
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignalHeuristic;

impl InteractionHeuristic for NoSignalHeuristic {
    fn score(&self, _address: &str, _transactions: &[TransactionSummary]) -> f64 {
        0.0
    }

    fn name(&self) -> &'static str {
        "no_signal"
    }
}
