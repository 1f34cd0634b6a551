//! Type definitions for Chain Sentinel
//! Findings, score results and network status reports

use serde::{Deserialize, Serialize};

use crate::models::errors::{AppError, ErrorCategory};

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Lenient parse for labels coming back from the inference endpoint.
    /// Unrecognised labels map to Medium.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "low" => Severity::Low,
            "info" | "informational" | "none" => Severity::Info,
            _ => Severity::Medium,
        }
    }

    /// Map a 0-1 heuristic score onto a severity band
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.8 => Severity::Critical,
            s if s >= 0.6 => Severity::High,
            s if s >= 0.4 => Severity::Medium,
            s if s >= 0.2 => Severity::Low,
            _ => Severity::Info,
        }
    }

    /// High and critical findings are surfaced separately in reports
    pub fn is_critical(&self) -> bool {
        *self >= Severity::High
    }
}

/// Kind of detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    /// Value transfer via call without a reentrancy guard
    #[serde(rename = "reentrancy")]
    Reentrancy,
    /// Low-level call whose return value is never checked
    #[serde(rename = "unchecked_return")]
    UncheckedExternalCall,
    /// No overflow-safe arithmetic library in use
    #[serde(rename = "integer_overflow")]
    MissingOverflowGuard,
    /// Authorization based on tx.origin
    #[serde(rename = "tx_origin")]
    UnsafeOriginCheck,
    /// Wallet interacted with suspicious contracts
    #[serde(rename = "suspicious_interactions")]
    SuspiciousInteraction,
    /// Reported by the inference endpoint
    #[serde(rename = "ai_reported")]
    AiReported,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Reentrancy => "reentrancy",
            FindingKind::UncheckedExternalCall => "unchecked_return",
            FindingKind::MissingOverflowGuard => "integer_overflow",
            FindingKind::UnsafeOriginCheck => "tx_origin",
            FindingKind::SuspiciousInteraction => "suspicious_interactions",
            FindingKind::AiReported => "ai_reported",
        }
    }

    /// Produced by local checks rather than the inference endpoint
    pub fn is_local(&self) -> bool {
        !matches!(self, FindingKind::AiReported)
    }
}

/// A single detected issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub description: String,
}

impl Finding {
    pub fn new(kind: FindingKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
        }
    }
}

/// What a scan looked at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanSubject {
    Contract,
    Wallet { address: String },
}

/// Final risk score plus the findings that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub subject: ScanSubject,
    pub chain_id: u64,
    /// Always within [0, 1]
    pub risk_score: f64,
    /// Local checks or wallet heuristic contribution, after clamping
    pub local_score: f64,
    /// Inference contribution (fallback value when the call failed)
    pub ai_score: f64,
    /// False when the inference call failed and a default was used
    pub ai_available: bool,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
}

impl ScoreResult {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

/// Risk banding of a 0-1 score
/// - 0.0-0.2: Safe
/// - 0.2-0.4: Low
/// - 0.4-0.6: Medium
/// - 0.6-0.8: High
/// - 0.8-1.0: Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.8 => RiskLevel::Critical,
            s if s >= 0.6 => RiskLevel::High,
            s if s >= 0.4 => RiskLevel::Medium,
            s if s >= 0.2 => RiskLevel::Low,
            _ => RiskLevel::Safe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "✅",
            RiskLevel::Low => "🟡",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
            RiskLevel::Critical => "💀",
        }
    }
}

/// Network health as seen through a freshly verified connection
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: ProbeStatus,
    pub chain_id: u64,
    pub network: String,
    #[serde(flatten)]
    pub detail: StatusDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StatusDetail {
    Healthy {
        endpoint: String,
        block_number: u64,
        /// Wei, as a decimal string to avoid precision loss in JSON
        gas_price: String,
        currency_symbol: String,
        is_connected: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        peer_count: Option<u64>,
    },
    Failed {
        error_type: ErrorCategory,
        error_code: &'static str,
        message: String,
        is_retryable: bool,
    },
}

impl StatusReport {
    pub fn failed(chain_id: u64, network: impl Into<String>, err: &AppError) -> Self {
        let category = match err.category() {
            c @ (ErrorCategory::Configuration
            | ErrorCategory::Connection
            | ErrorCategory::Validation
            | ErrorCategory::Cancelled) => c,
            _ => ErrorCategory::Unknown,
        };
        let is_retryable = match category {
            ErrorCategory::Configuration | ErrorCategory::Validation | ErrorCategory::Cancelled => {
                false
            }
            _ => true,
        };

        Self {
            status: ProbeStatus::Error,
            chain_id,
            network: network.into(),
            detail: StatusDetail::Failed {
                error_type: category,
                error_code: err.code_str(),
                message: err.message.clone(),
                is_retryable,
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ProbeStatus::Ok
    }

    pub fn error_type(&self) -> Option<ErrorCategory> {
        match &self.detail {
            StatusDetail::Failed { error_type, .. } => Some(*error_type),
            StatusDetail::Healthy { .. } => None,
        }
    }
}

/// Minimal transaction record handed to transaction-pattern analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub hash: String,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Wei, decimal string
    pub value: String,
    pub block_number: Option<u64>,
    /// Calldata present (contract interaction)
    pub has_input: bool,
}
