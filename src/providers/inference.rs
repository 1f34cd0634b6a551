//! Inference Endpoint Client
//!
//! `InferenceClient` is the seam to the external scoring model: a system
//! prompt plus a user prompt in, a JSON object out. `OpenAiInferenceClient`
//! speaks the OpenAI-compatible chat-completions protocol with JSON output
//! mode enabled.

use async_trait::async_trait;
use eyre::{bail, eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde_json::{json, Value};
use tracing::debug;

use crate::models::config::InferenceConfig;
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run one completion and return the model's JSON object
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Value>;

    fn provider_name(&self) -> &'static str;
}

pub struct OpenAiInferenceClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiInferenceClient {
    pub fn new(config: &InferenceConfig) -> AppResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::missing_api_key("OPENAI_API_KEY"))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| AppError::missing_api_key("OPENAI_API_KEY"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::inference(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }
}

#[async_trait]
impl InferenceClient for OpenAiInferenceClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "response_format": { "type": "json_object" },
        });

        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            bail!("Inference API error (status {}): {}", status, error_text);
        }

        let json: Value = resp.json().await?;

        // Parse choices[0].message.content
        let content = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| eyre!("Inference response missing content"))?;

        debug!(model = %self.model, bytes = content.len(), "Inference completion received");

        serde_json::from_str(content).map_err(|e| eyre!("Inference content is not JSON: {}", e))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Stand-in used when no API key is configured: every call fails, so the
/// pipeline applies its conservative defaults.
pub struct UnconfiguredInference;

#[async_trait]
impl InferenceClient for UnconfiguredInference {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<Value> {
        bail!("Inference endpoint not configured (OPENAI_API_KEY missing)")
    }

    fn provider_name(&self) -> &'static str {
        "unconfigured"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> InferenceConfig {
        InferenceConfig {
            base_url,
            model: "gpt-4o".to_string(),
            api_key: Some("test-key".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_requires_api_key() {
        let mut cfg = config("http://localhost".to_string());
        cfg.api_key = None;
        assert!(OpenAiInferenceClient::new(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_complete_parses_json_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "content": "{\"risk_score\": 0.25, \"vulnerabilities\": []}" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiInferenceClient::new(&config(format!("{}/v1", server.uri()))).unwrap();
        let value = client.complete("system", "user").await.unwrap();
        assert_eq!(value["risk_score"], json!(0.25));
    }

    #[tokio::test]
    async fn test_complete_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = OpenAiInferenceClient::new(&config(format!("{}/v1", server.uri()))).unwrap();
        let err = client.complete("system", "user").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_unconfigured_always_fails() {
        assert!(UnconfiguredInference.complete("s", "u").await.is_err());
    }
}
