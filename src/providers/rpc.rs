//! RPC Client Module - Single-endpoint JSON-RPC transport
//!
//! One `RpcProvider` talks to exactly one endpoint URL. Retries, fallback
//! ordering and chain verification are owned by the connection manager in
//! core/connection.rs; every call here is a single attempt.
//!
//! - User-Agent header on every request
//! - Gzip compression for large block payloads
//! - Per-endpoint timeout taken from the NetworkProfile

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;

/// JSON-RPC request body
#[derive(Debug, Clone, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Rate limit (HTTP 429 equivalent, code -32005)
    pub fn is_rate_limit(&self) -> bool {
        self.code == -32005 || self.message.to_lowercase().contains("rate limit")
    }
}

/// Thin block header view: only what the health checks need
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub number: Option<String>,
    pub hash: Option<String>,
}

/// Transaction object as returned inside full blocks
#[derive(Debug, Clone, Deserialize)]
pub struct RpcTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default, rename = "blockNumber")]
    pub block_number: Option<String>,
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockWithTransactions {
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// HTTP JSON-RPC client bound to one endpoint
#[derive(Clone)]
pub struct RpcProvider {
    url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for RpcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcProvider")
            .field("url", &self.masked_url())
            .finish()
    }
}

impl RpcProvider {
    /// Transport-level connect: build a client bound to `url`
    pub fn connect(url: &str, timeout: Duration) -> AppResult<Self> {
        reqwest::Url::parse(url).map_err(|e| {
            AppError::new(
                ErrorCode::ConfigInvalidValue,
                format!("Invalid RPC URL {}: {}", url, e),
            )
        })?;

        Ok(Self {
            url: url.to_string(),
            client: Self::build_client(timeout)?,
        })
    }

    /// Build HTTP client with custom headers
    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::rpc_connection_failed(format!("Failed to build HTTP client: {}", e)))
    }

    /// Execute a single JSON-RPC call. `null` results are reported as `None`.
    pub async fn call_optional<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<Option<T>> {
        let payload = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if status == 429 {
            return Err(AppError::rpc_connection_failed("Rate limited (HTTP 429)"));
        }
        if !status.is_success() {
            return Err(AppError::rpc_connection_failed(format!("HTTP error: {}", status)));
        }

        let json: RpcResponse<T> = response.json().await?;

        if let Some(error) = json.error {
            debug!(method, code = error.code, "RPC error response");
            let code = if error.is_rate_limit() {
                ErrorCode::RpcConnectionFailed
            } else {
                ErrorCode::RpcError
            };
            return Err(AppError::new(
                code,
                format!("RPC error: {} (code: {})", error.message, error.code),
            ));
        }

        Ok(json.result)
    }

    /// Execute a JSON-RPC call that must return a non-null result
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| AppError::rpc_invalid_response(format!("No result in {} response", method)))
    }

    /// Liveness probe (`web3_clientVersion`)
    pub async fn client_version(&self) -> AppResult<String> {
        self.call("web3_clientVersion", serde_json::json!([])).await
    }

    /// Latest block header; errors if the node returns null
    pub async fn latest_block(&self) -> AppResult<BlockHeader> {
        self.call("eth_getBlockByNumber", serde_json::json!(["latest", false]))
            .await
            .map_err(|e| match e.code {
                ErrorCode::RpcInvalidResponse => {
                    AppError::rpc_invalid_response("Failed to retrieve latest block")
                }
                _ => e,
            })
    }

    /// Latest block including full transaction objects
    pub async fn latest_block_with_transactions(&self) -> AppResult<BlockWithTransactions> {
        self.call("eth_getBlockByNumber", serde_json::json!(["latest", true]))
            .await
    }

    pub async fn chain_id(&self) -> AppResult<u64> {
        let raw: String = self.call("eth_chainId", serde_json::json!([])).await?;
        parse_hex_u64(&raw)
    }

    pub async fn block_number(&self) -> AppResult<u64> {
        let raw: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_hex_u64(&raw)
    }

    /// Gas price in wei
    pub async fn gas_price(&self) -> AppResult<u128> {
        let raw: String = self.call("eth_gasPrice", serde_json::json!([])).await?;
        parse_hex_u128(&raw)
    }

    pub async fn peer_count(&self) -> AppResult<u64> {
        let raw: String = self.call("net_peerCount", serde_json::json!([])).await?;
        parse_hex_u64(&raw)
    }

    /// `eth_syncing` returns `false` when idle and a progress object while syncing
    pub async fn is_syncing(&self) -> AppResult<bool> {
        let raw: serde_json::Value = self.call("eth_syncing", serde_json::json!([])).await?;
        Ok(match raw {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::Null => false,
            _ => true,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get RPC URL with any path-embedded key hidden (for logging)
    pub fn masked_url(&self) -> String {
        mask_url(&self.url)
    }
}

/// Hide API keys embedded in endpoint paths (".../v2/<key>", ".../v3/<key>")
pub fn mask_url(url: &str) -> String {
    for marker in ["/v2/", "/v3/"] {
        if let Some((base, key)) = url.split_once(marker) {
            if !key.is_empty() {
                return format!("{}{}***HIDDEN***", base, marker);
            }
        }
    }
    url.to_string()
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_hex_u64(raw: &str) -> AppResult<u64> {
    let digits = raw.trim().trim_start_matches("0x");
    u64::from_str_radix(if digits.is_empty() { "0" } else { digits }, 16)
        .map_err(|e| AppError::rpc_invalid_response(format!("Invalid hex quantity {:?}: {}", raw, e)))
}

pub fn parse_hex_u128(raw: &str) -> AppResult<u128> {
    let digits = raw.trim().trim_start_matches("0x");
    u128::from_str_radix(if digits.is_empty() { "0" } else { digits }, 16)
        .map_err(|e| AppError::rpc_invalid_response(format!("Invalid hex quantity {:?}: {}", raw, e)))
}
