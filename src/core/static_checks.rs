//! Local pattern checks over Solidity source
//!
//! Fast, case-sensitive substring and regex checks. Each rule contributes an
//! independent increment to the local subtotal; the subtotal is left
//! unclamped here and clamped when combined with the AI score.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::types::{Finding, FindingKind, Severity};

/// Increment per rule
pub mod rule_weights {
    pub const REENTRANCY: f64 = 0.4;
    pub const UNCHECKED_CALL: f64 = 0.3;
    pub const MISSING_OVERFLOW_GUARD: f64 = 0.2;
    pub const TX_ORIGIN: f64 = 0.4;
}

lazy_static! {
    static ref LOW_LEVEL_CALL: Regex =
        Regex::new(r#"\.call\{.*\}\(".*"\)"#).expect("low-level call pattern is valid");
    static ref REQUIRED_CALL: Regex =
        Regex::new(r"require\(.*\.call").expect("require(call) pattern is valid");
}

/// Result of the local checks
#[derive(Debug, Clone, Default)]
pub struct LocalAnalysis {
    /// Sum of rule increments, may exceed 1.0
    pub raw_score: f64,
    pub findings: Vec<Finding>,
}

impl LocalAnalysis {
    fn flag(&mut self, kind: FindingKind, severity: Severity, weight: f64, description: &str) {
        self.findings.push(Finding::new(kind, severity, description));
        self.raw_score += weight;
    }

    /// Subtotal clamped to [0, 1]
    pub fn clamped_score(&self) -> f64 {
        self.raw_score.clamp(0.0, 1.0)
    }
}

/// Run every local rule against contract source
pub fn run_local_checks(source: &str) -> LocalAnalysis {
    let mut analysis = LocalAnalysis::default();

    if source.contains("call.value") && !source.contains("ReentrancyGuard") {
        analysis.flag(
            FindingKind::Reentrancy,
            Severity::High,
            rule_weights::REENTRANCY,
            "Potential reentrancy vulnerability detected",
        );
    }

    if LOW_LEVEL_CALL.is_match(source) && !REQUIRED_CALL.is_match(source) {
        analysis.flag(
            FindingKind::UncheckedExternalCall,
            Severity::Medium,
            rule_weights::UNCHECKED_CALL,
            "Unchecked return value from low-level call",
        );
    }

    if !source.contains("SafeMath") {
        analysis.flag(
            FindingKind::MissingOverflowGuard,
            Severity::Medium,
            rule_weights::MISSING_OVERFLOW_GUARD,
            "No SafeMath usage detected",
        );
    }

    if source.contains("tx.origin") {
        analysis.flag(
            FindingKind::UnsafeOriginCheck,
            Severity::High,
            rule_weights::TX_ORIGIN,
            "Dangerous tx.origin usage detected",
        );
    }

    analysis
}
