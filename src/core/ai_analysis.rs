//! AI Analysis - rate-limited inference calls with typed responses
//!
//! Contract analysis and transaction-pattern analysis each pass through
//! their own sliding-window limiter before reaching the inference endpoint.
//! The model's JSON is parsed into `AiAssessment`; a missing or non-numeric
//! `risk_score` is a schema violation. Issue entries are read loosely and
//! unusable ones are skipped.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::rate_limiter::RateLimiter;
use crate::core::risk_score::clamp_unit;
use crate::models::config::RateLimitConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Finding, FindingKind, Severity, TransactionSummary};
use crate::providers::inference::InferenceClient;

/// First present field among `keys`, rendered as text. Non-string values
/// (numbers, objects) are kept in their JSON form.
fn text_field(entry: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find_map(|value| match value {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        })
}

fn severity_field(entry: &serde_json::Map<String, Value>) -> Severity {
    match entry.get("severity").or_else(|| entry.get("risk_level")) {
        Some(Value::String(label)) => Severity::parse_lenient(label),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(score) if (0.0..=1.0).contains(&score) => Severity::from_score(score),
            _ => Severity::Medium,
        },
        _ => Severity::Medium,
    }
}

/// One issue reported by the model. Entries may be bare strings or objects
/// with loosely typed fields; anything else is skipped.
fn issue_to_finding(issue: &Value) -> Option<Finding> {
    match issue {
        Value::String(text) if !text.trim().is_empty() => Some(Finding::new(
            FindingKind::AiReported,
            Severity::Medium,
            text.trim(),
        )),
        Value::Object(entry) => {
            let title = text_field(entry, &["type", "title", "name", "flag"]);
            let details = text_field(entry, &["description", "details"]);
            let description = match (title, details) {
                (Some(t), Some(d)) => format!("{}: {}", t, d),
                (Some(t), None) => t,
                (None, Some(d)) => d,
                (None, None) => return None,
            };
            Some(Finding::new(
                FindingKind::AiReported,
                severity_field(entry),
                description,
            ))
        }
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct RawAssessment {
    risk_score: f64,
    #[serde(default, alias = "suspicious_patterns")]
    vulnerabilities: Value,
}

/// Typed model verdict
#[derive(Debug, Clone, PartialEq)]
pub struct AiAssessment {
    /// Clamped to [0, 1]
    pub risk_score: f64,
    pub findings: Vec<Finding>,
}

impl AiAssessment {
    /// Parse the model's JSON object
    pub fn from_value(value: Value) -> AppResult<Self> {
        let raw: RawAssessment = serde_json::from_value(value)
            .map_err(|e| AppError::inference_schema(format!("Unexpected AI response: {}", e)))?;
        if !raw.risk_score.is_finite() {
            return Err(AppError::inference_schema("risk_score is not a finite number"));
        }
        let issues = raw.vulnerabilities.as_array().map(Vec::as_slice).unwrap_or_default();
        let findings: Vec<Finding> = issues.iter().filter_map(issue_to_finding).collect();
        if findings.len() < issues.len() {
            debug!(
                skipped = issues.len() - findings.len(),
                "Ignored unusable entries in AI response"
            );
        }
        Ok(Self {
            risk_score: clamp_unit(raw.risk_score),
            findings,
        })
    }
}

fn contract_system_prompt(network_name: &str) -> String {
    format!(
        "You are a blockchain security expert. Analyze the smart contract code for security \
         vulnerabilities, specifically for the {} network. Consider network-specific \
         vulnerabilities and standards. Respond with a JSON object containing \"risk_score\" \
         (0 to 1) and \"vulnerabilities\" (a list of objects with \"type\", \"description\" \
         and \"severity\").",
        network_name
    )
}

fn transaction_system_prompt(network_name: &str) -> String {
    format!(
        "You are a blockchain transaction analysis expert. Analyze these {} transactions for \
         suspicious patterns. Respond with a JSON object containing \"risk_score\" (0 to 1) \
         and \"suspicious_patterns\" (a list of objects with \"type\", \"description\" and \
         \"severity\").",
        network_name
    )
}

/// Inference client plus one limiter per analysis class
pub struct AiAnalyzer {
    client: Arc<dyn InferenceClient>,
    contract_limiter: RateLimiter,
    transaction_limiter: RateLimiter,
}

impl AiAnalyzer {
    pub fn new(client: Arc<dyn InferenceClient>, limits: RateLimitConfig) -> Self {
        Self {
            client,
            contract_limiter: RateLimiter::from_config("contract_analysis", limits),
            transaction_limiter: RateLimiter::from_config("transaction_analysis", limits),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.provider_name()
    }

    pub fn contract_limiter(&self) -> &RateLimiter {
        &self.contract_limiter
    }

    pub fn transaction_limiter(&self) -> &RateLimiter {
        &self.transaction_limiter
    }

    pub async fn analyze_contract(
        &self,
        source: &str,
        network_name: &str,
        cancel: &CancellationToken,
    ) -> AppResult<AiAssessment> {
        self.contract_limiter.acquire(cancel).await?;
        let user_prompt = format!("Analyze this smart contract code:\n\n{}", source);
        self.run(&contract_system_prompt(network_name), &user_prompt, cancel)
            .await
    }

    pub async fn analyze_transactions(
        &self,
        transactions: &[TransactionSummary],
        network_name: &str,
        cancel: &CancellationToken,
    ) -> AppResult<AiAssessment> {
        self.transaction_limiter.acquire(cancel).await?;
        let encoded = serde_json::to_string(transactions)?;
        let user_prompt = format!("Analyze these transactions:\n\n{}", encoded);
        self.run(&transaction_system_prompt(network_name), &user_prompt, cancel)
            .await
    }

    async fn run(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        cancel: &CancellationToken,
    ) -> AppResult<AiAssessment> {
        debug!(provider = self.client.provider_name(), "🤖 Requesting AI analysis");

        let value = tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::cancelled("AI analysis")),
            result = self.client.complete(system_prompt, user_prompt) => {
                result.map_err(|e| AppError::inference(format!("AI analysis failed: {}", e)))?
            }
        };

        let assessment = AiAssessment::from_value(value)?;
        info!(
            "🤖 AI risk score {:.2} ({} issues)",
            assessment.risk_score,
            assessment.findings.len()
        );
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recording {
        reply: Value,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InferenceClient for Recording {
        async fn complete(&self, system_prompt: &str, _user_prompt: &str) -> eyre::Result<Value> {
            self.prompts.lock().unwrap().push(system_prompt.to_string());
            Ok(self.reply.clone())
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }
    }

    fn limits() -> RateLimitConfig {
        RateLimitConfig {
            max_requests: 50,
            window: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_parse_full_assessment() {
        let assessment = AiAssessment::from_value(json!({
            "risk_score": 0.8,
            "vulnerabilities": [
                {"type": "Access control", "description": "owner can drain", "severity": "critical"},
                "Unbounded loop"
            ]
        }))
        .unwrap();
        assert_eq!(assessment.risk_score, 0.8);
        assert_eq!(assessment.findings.len(), 2);
        assert_eq!(assessment.findings[0].severity, Severity::Critical);
        assert_eq!(assessment.findings[0].description, "Access control: owner can drain");
        assert_eq!(assessment.findings[1].severity, Severity::Medium);
        assert!(assessment.findings.iter().all(|f| f.kind == FindingKind::AiReported));
    }

    #[test]
    fn test_parse_defaults_and_alias() {
        let assessment = AiAssessment::from_value(json!({"risk_score": 2.5})).unwrap();
        assert_eq!(assessment.risk_score, 1.0);
        assert!(assessment.findings.is_empty());

        let assessment = AiAssessment::from_value(json!({
            "risk_score": 0.4,
            "suspicious_patterns": [{"flag": "dusting"}]
        }))
        .unwrap();
        assert_eq!(assessment.findings[0].description, "dusting");
    }

    #[test]
    fn test_loosely_typed_entries_keep_the_score() {
        let assessment = AiAssessment::from_value(json!({
            "risk_score": 0.2,
            "vulnerabilities": [
                {"type": "x", "severity": 3},
                {"type": 7, "description": {"line": 12}, "severity": 0.9},
                42,
                null,
                {"severity": "high"}
            ]
        }))
        .unwrap();
        assert_eq!(assessment.risk_score, 0.2);
        assert_eq!(assessment.findings.len(), 2);
        assert_eq!(assessment.findings[0].description, "x");
        assert_eq!(assessment.findings[0].severity, Severity::Medium);
        assert_eq!(assessment.findings[1].description, "7: {\"line\":12}");
        assert_eq!(assessment.findings[1].severity, Severity::Critical);

        let assessment = AiAssessment::from_value(json!({
            "risk_score": 0.6,
            "suspicious_patterns": "none found"
        }))
        .unwrap();
        assert_eq!(assessment.risk_score, 0.6);
        assert!(assessment.findings.is_empty());
    }

    #[test]
    fn test_missing_score_is_schema_violation() {
        let err = AiAssessment::from_value(json!({"vulnerabilities": []})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InferenceInvalidResponse);
        let err = AiAssessment::from_value(json!({"risk_score": "high"})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InferenceInvalidResponse);
    }

    #[tokio::test]
    async fn test_network_name_in_prompt() {
        let client = Arc::new(Recording {
            reply: json!({"risk_score": 0.1}),
            prompts: Mutex::new(Vec::new()),
        });
        let analyzer = AiAnalyzer::new(client.clone(), limits());
        let token = CancellationToken::new();

        analyzer
            .analyze_contract("contract A {}", "Polygon Mainnet", &token)
            .await
            .unwrap();
        analyzer.analyze_transactions(&[], "BSC Mainnet", &token).await.unwrap();

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].contains("Polygon Mainnet"));
        assert!(prompts[1].contains("BSC Mainnet"));
        assert_eq!(analyzer.contract_limiter().in_flight(), 1);
        assert_eq!(analyzer.transaction_limiter().in_flight(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let client = Arc::new(Recording {
            reply: json!({"risk_score": 0.1}),
            prompts: Mutex::new(Vec::new()),
        });
        let analyzer = AiAnalyzer::new(client.clone(), limits());
        let token = CancellationToken::new();
        token.cancel();

        let err = analyzer.analyze_contract("x", "Ethereum", &token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(client.prompts.lock().unwrap().is_empty());
    }
}
