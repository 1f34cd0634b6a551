//! Configuration module for Chain Sentinel
//!
//! Network profiles and service settings. Defaults come from
//! utils/constants.rs; environment variables override them at startup.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{
    default_rpc_urls, get_chain_name, get_explorer_url, get_native_symbol, is_testnet,
    rpc_urls_env_key, DEFAULT_INFERENCE_MODEL, DEFAULT_INFERENCE_TIMEOUT_SECS,
    DEFAULT_INFERENCE_URL, DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS,
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_COUNT, DEFAULT_RPC_TIMEOUT_SECS,
    SUPPORTED_CHAIN_IDS,
};

/// Immutable per-network configuration
#[derive(Debug, Clone, Serialize)]
pub struct NetworkProfile {
    pub chain_id: u64,
    pub name: String,
    pub is_testnet: bool,
    /// Candidate endpoints in fallback order
    pub rpc_urls: Vec<String>,
    pub explorer_url: String,
    pub currency_symbol: String,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Attempts per endpoint
    pub retry_count: u32,
    #[serde(skip)]
    pub retry_base_delay: Duration,
}

impl NetworkProfile {
    /// Built-in profile for a supported chain, without env overrides
    pub fn builtin(chain_id: u64) -> Option<Self> {
        let urls = default_rpc_urls(chain_id);
        if urls.is_empty() {
            return None;
        }

        Some(Self {
            chain_id,
            name: get_chain_name(chain_id).to_string(),
            is_testnet: is_testnet(chain_id),
            rpc_urls: urls.iter().map(|u| u.to_string()).collect(),
            explorer_url: get_explorer_url(chain_id).to_string(),
            currency_symbol: get_native_symbol(chain_id).to_string(),
            timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        })
    }

    /// Profile for an arbitrary network (custom deployments, tests)
    pub fn custom(chain_id: u64, name: impl Into<String>, rpc_urls: Vec<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
            is_testnet: false,
            rpc_urls,
            explorer_url: String::new(),
            currency_symbol: "ETH".to_string(),
            timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }

    pub fn with_retry(mut self, retry_count: u32, base_delay: Duration) -> Self {
        self.retry_count = retry_count;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backoff before the attempt following `failed_attempt` (0-based): 1x, 2x, 3x base
    pub fn backoff_after(&self, failed_attempt: u32) -> Duration {
        self.retry_base_delay * (failed_attempt + 1)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}

/// Table of NetworkProfiles keyed by chain id. Built once, never mutated.
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    profiles: HashMap<u64, NetworkProfile>,
}

impl NetworkRegistry {
    pub fn new(profiles: impl IntoIterator<Item = NetworkProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.chain_id, p)).collect(),
        }
    }

    /// Built-in profiles with env overrides applied
    pub fn from_env() -> Self {
        let timeout = env_parse("SENTINEL_RPC_TIMEOUT_SECS").map(Duration::from_secs);
        let retries = env_parse::<u32>("SENTINEL_RETRY_COUNT");

        let profiles = SUPPORTED_CHAIN_IDS.iter().filter_map(|&chain_id| {
            let mut profile = NetworkProfile::builtin(chain_id)?;

            if let Ok(raw) = std::env::var(rpc_urls_env_key(chain_id)) {
                let urls: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(String::from)
                    .collect();
                if urls.is_empty() {
                    warn!("⚠️ {} is set but empty, keeping defaults", rpc_urls_env_key(chain_id));
                } else {
                    info!("🔧 Chain {}: {} endpoint(s) from environment", chain_id, urls.len());
                    profile.rpc_urls = urls;
                }
            }
            if let Some(t) = timeout {
                profile.timeout = t;
            }
            if let Some(r) = retries.filter(|r| *r > 0) {
                profile.retry_count = r;
            }
            Some(profile)
        });

        Self::new(profiles)
    }

    pub fn get(&self, chain_id: u64) -> Option<&NetworkProfile> {
        self.profiles.get(&chain_id)
    }

    /// Resolve or fail with a configuration error
    pub fn resolve(&self, chain_id: u64) -> AppResult<&NetworkProfile> {
        self.get(chain_id).ok_or_else(|| AppError::unsupported_chain(chain_id))
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.profiles.contains_key(&chain_id)
    }

    /// Profiles sorted by chain id
    pub fn all(&self) -> Vec<&NetworkProfile> {
        let mut all: Vec<_> = self.profiles.values().collect();
        all.sort_by_key(|p| p.chain_id);
        all
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Sliding-window limits for inference calls
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests per window
    pub max_requests: usize,
    /// Window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: env_parse("SENTINEL_RATE_LIMIT_MAX")
                .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
            window: Duration::from_secs(
                env_parse("SENTINEL_RATE_LIMIT_WINDOW_SECS")
                    .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            ),
        }
    }
}

/// External inference endpoint settings
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// OpenAI-compatible base URL (".../v1")
    pub base_url: String,
    pub model: String,
    /// Key is never logged
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("SENTINEL_INFERENCE_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string()),
            model: std::env::var("SENTINEL_INFERENCE_MODEL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_MODEL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(DEFAULT_INFERENCE_TIMEOUT_SECS),
        }
    }
}

/// Top-level configuration assembled at startup
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    pub networks: NetworkRegistry,
    pub inference: InferenceConfig,
    pub rate_limit: RateLimitConfig,
}

impl SentinelConfig {
    pub fn from_env() -> Self {
        let config = Self {
            networks: NetworkRegistry::from_env(),
            inference: InferenceConfig::default(),
            rate_limit: RateLimitConfig::default(),
        };
        if config.inference.api_key.is_some() {
            info!("🔑 OPENAI_API_KEY configured (key hidden)");
        } else {
            warn!("⚠️ OPENAI_API_KEY not set, AI analysis will fall back to conservative defaults");
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
