//! Scan report summaries

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::types::{Finding, ScoreResult, Severity};

/// Summary handed back alongside a score
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub risk_score: f64,
    pub risk_level: &'static str,
    pub total_findings: usize,
    /// Count per severity label; every severity is present
    pub severity_breakdown: BTreeMap<&'static str, usize>,
    /// High and critical findings only
    pub critical_findings: Vec<Finding>,
    pub recommendations: Vec<String>,
}

impl ScanReport {
    pub fn from_result(result: &ScoreResult) -> Self {
        let mut severity_breakdown: BTreeMap<&'static str, usize> =
            Severity::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for finding in &result.findings {
            *severity_breakdown.entry(finding.severity.as_str()).or_default() += 1;
        }

        Self {
            scan_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            risk_score: result.risk_score,
            risk_level: result.risk_level().as_str(),
            total_findings: result.findings.len(),
            severity_breakdown,
            critical_findings: result
                .findings
                .iter()
                .filter(|f| f.severity.is_critical())
                .cloned()
                .collect(),
            recommendations: result.recommendations.clone(),
        }
    }

    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339()
    }
}

/// One-line rendering: `[HIGH] reentrancy: Potential reentrancy ...`
pub fn format_finding(finding: &Finding) -> String {
    format!(
        "[{}] {}: {}",
        finding.severity.as_str().to_uppercase(),
        finding.kind.as_str(),
        finding.description
    )
}
