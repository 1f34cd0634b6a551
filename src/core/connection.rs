//! Connection Manager - Chain-verified RPC handles with ordered fallback
//!
//! `acquire` hands out a `ConnectionHandle` only after the endpoint has
//! answered a liveness probe, returned a latest block, reported the expected
//! chain id and (where supported) denied being mid-sync.
//!
//! Endpoint selection is an explicit state machine per call:
//!
//! ```text
//! Trying(endpoint, attempt) -> Success
//!                           -> NextAttempt  (backoff: (attempt+1) * base)
//!                           -> NextEndpoint (attempts exhausted or chain id mismatch)
//!                           -> Exhausted    (no endpoints left)
//! ```
//!
//! Attempts are strictly sequential. Backoff sleeps only block the calling
//! task and are cut short by cancellation.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::config::{NetworkProfile, NetworkRegistry};
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{ProbeStatus, StatusDetail, StatusReport};
use crate::providers::rpc::{mask_url, RpcProvider};
use crate::utils::cache::{CacheStats, HandleCache};

/// A live RPC session whose chain id was verified at acquisition
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    chain_id: u64,
    provider: RpcProvider,
}

impl ConnectionHandle {
    pub(crate) fn new(chain_id: u64, provider: RpcProvider) -> Self {
        Self { chain_id, provider }
    }

    /// Chain id confirmed by the endpoint at acquisition time
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn endpoint(&self) -> &str {
        self.provider.url()
    }

    pub fn masked_endpoint(&self) -> String {
        self.provider.masked_url()
    }

    pub fn rpc(&self) -> &RpcProvider {
        &self.provider
    }

    /// Cheap liveness call
    pub async fn is_alive(&self) -> bool {
        self.provider.client_version().await.is_ok()
    }

    /// Ask the endpoint for its chain id again and compare
    pub async fn verify_chain_id(&self) -> AppResult<()> {
        let reported = self.provider.chain_id().await?;
        if reported != self.chain_id {
            return Err(AppError::chain_id_mismatch(self.chain_id, reported));
        }
        Ok(())
    }
}

/// Outcome of one attempt against one endpoint
enum AttemptOutcome {
    Verified(ConnectionHandle),
    /// Transient failure, same endpoint may be retried
    Retry(AppError),
    /// Endpoint is unusable for this chain, skip remaining attempts
    Skip(AppError),
}

/// Acquisition state machine
enum AcquireState {
    Trying { endpoint: usize, attempt: u32 },
    Success(ConnectionHandle),
    Exhausted,
}

/// Owns the profile table and the per-chain handle cache.
/// Constructed once per process and shared via `Arc`.
pub struct ConnectionManager {
    registry: Arc<NetworkRegistry>,
    cache: HandleCache,
}

impl ConnectionManager {
    pub fn new(registry: Arc<NetworkRegistry>) -> Self {
        Self {
            registry,
            cache: HandleCache::new(),
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn profile(&self, chain_id: u64) -> AppResult<&NetworkProfile> {
        self.registry.resolve(chain_id)
    }

    /// Get a verified handle for `chain_id`
    pub async fn acquire(&self, chain_id: u64, force_refresh: bool) -> AppResult<ConnectionHandle> {
        self.acquire_with_cancel(chain_id, force_refresh, &CancellationToken::new())
            .await
    }

    /// Cancellable variant: the token is checked before every attempt and
    /// interrupts backoff sleeps.
    pub async fn acquire_with_cancel(
        &self,
        chain_id: u64,
        force_refresh: bool,
        cancel: &CancellationToken,
    ) -> AppResult<ConnectionHandle> {
        let profile = self.registry.resolve(chain_id)?;

        if profile.rpc_urls.is_empty() {
            return Err(AppError::new(
                ErrorCode::ConfigNoEndpoints,
                format!("No RPC endpoints configured for {}", profile.name),
            ));
        }

        if !force_refresh {
            if let Some(handle) = self.cache.get(chain_id) {
                if handle.is_alive().await {
                    return Ok(handle);
                }
                warn!(
                    "⚠️ Cached handle for chain {} stopped answering ({}), reconnecting",
                    chain_id,
                    handle.masked_endpoint()
                );
                self.cache.invalidate(chain_id);
            }
        }

        let handle = self.select_endpoint(profile, cancel).await?;
        self.cache.set(handle.clone());
        Ok(handle)
    }

    /// Walk the endpoint list until one passes every health stage
    async fn select_endpoint(
        &self,
        profile: &NetworkProfile,
        cancel: &CancellationToken,
    ) -> AppResult<ConnectionHandle> {
        let retry_count = profile.retry_count.max(1);
        let mut last_error: Option<(String, AppError)> = None;
        let mut state = AcquireState::Trying {
            endpoint: 0,
            attempt: 0,
        };

        loop {
            state = match state {
                AcquireState::Trying { endpoint, attempt } => {
                    let Some(url) = profile.rpc_urls.get(endpoint) else {
                        break;
                    };
                    if cancel.is_cancelled() {
                        return Err(AppError::cancelled("Connection attempt"));
                    }

                    debug!(
                        chain_id = profile.chain_id,
                        endpoint = %mask_url(url),
                        attempt = attempt + 1,
                        "Trying RPC endpoint"
                    );

                    match Self::attempt(profile, url).await {
                        AttemptOutcome::Verified(handle) => AcquireState::Success(handle),
                        AttemptOutcome::Retry(err) if attempt + 1 < retry_count => {
                            warn!(
                                "⚠️ {} attempt {}/{} failed: {}",
                                mask_url(url),
                                attempt + 1,
                                retry_count,
                                err
                            );
                            last_error = Some((url.clone(), err));

                            let delay = profile.backoff_after(attempt);
                            tokio::select! {
                                _ = cancel.cancelled() => {
                                    return Err(AppError::cancelled("Connection backoff"));
                                }
                                _ = tokio::time::sleep(delay) => {}
                            }
                            AcquireState::Trying {
                                endpoint,
                                attempt: attempt + 1,
                            }
                        }
                        AttemptOutcome::Retry(err) | AttemptOutcome::Skip(err) => {
                            warn!("⚠️ Giving up on {}: {}", mask_url(url), err);
                            last_error = Some((url.clone(), err));
                            AcquireState::Trying {
                                endpoint: endpoint + 1,
                                attempt: 0,
                            }
                        }
                    }
                }
                AcquireState::Success(handle) => {
                    info!(
                        "✅ Connected to {} (chain {}) via {}",
                        profile.name,
                        profile.chain_id,
                        handle.masked_endpoint()
                    );
                    return Ok(handle);
                }
                AcquireState::Exhausted => break,
            };

            if let AcquireState::Trying { endpoint, .. } = &state {
                if *endpoint >= profile.rpc_urls.len() {
                    state = AcquireState::Exhausted;
                }
            }
        }

        Err(Self::exhausted_error(profile, last_error))
    }

    /// One pass through the five health stages against one endpoint
    async fn attempt(profile: &NetworkProfile, url: &str) -> AttemptOutcome {
        // 1. transport connect
        let provider = match RpcProvider::connect(url, profile.timeout) {
            Ok(p) => p,
            Err(e) => return AttemptOutcome::Skip(e),
        };

        // 2. liveness
        if let Err(e) = provider.client_version().await {
            return AttemptOutcome::Retry(AppError::new(
                e.code,
                format!("Basic connection test failed: {}", e.message),
            ));
        }

        // 3. latest block
        if let Err(e) = provider.latest_block().await {
            return AttemptOutcome::Retry(e);
        }

        // 4. chain identity
        match provider.chain_id().await {
            Ok(reported) if reported == profile.chain_id => {}
            Ok(reported) => {
                return AttemptOutcome::Skip(AppError::chain_id_mismatch(profile.chain_id, reported))
            }
            Err(e) => return AttemptOutcome::Retry(e),
        }

        // 5. sync status, best-effort
        match provider.is_syncing().await {
            Ok(true) => return AttemptOutcome::Retry(AppError::node_syncing(&mask_url(url))),
            Ok(false) => {}
            Err(e) => debug!("eth_syncing unsupported on {}: {}", mask_url(url), e),
        }

        AttemptOutcome::Verified(ConnectionHandle::new(profile.chain_id, provider))
    }

    fn exhausted_error(profile: &NetworkProfile, last: Option<(String, AppError)>) -> AppError {
        let mut message = format!(
            "Failed to connect to network {} after trying all RPCs",
            profile.chain_id
        );
        let code = match &last {
            Some((url, err)) => {
                message.push_str(&format!(": {} -> {}", mask_url(url), err));
                if err.code == ErrorCode::ChainIdMismatch {
                    ErrorCode::ChainIdMismatch
                } else {
                    ErrorCode::RpcEndpointsExhausted
                }
            }
            None => ErrorCode::RpcEndpointsExhausted,
        };
        warn!("❌ {}", message);
        AppError::new(code, message)
    }

    /// Fresh, cache-bypassing health report for a network
    pub async fn probe_status(&self, chain_id: u64) -> StatusReport {
        let network = match self.registry.get(chain_id) {
            Some(p) => p.name.clone(),
            None => {
                return StatusReport::failed(
                    chain_id,
                    format!("Network {}", chain_id),
                    &AppError::unsupported_chain(chain_id),
                )
            }
        };

        let handle = match self.acquire(chain_id, true).await {
            Ok(h) => h,
            Err(e) => return StatusReport::failed(chain_id, network, &e),
        };

        match Self::collect_status(&handle).await {
            Ok((block_number, gas_price, peer_count)) => {
                let currency_symbol = self
                    .registry
                    .get(chain_id)
                    .map(|p| p.currency_symbol.clone())
                    .unwrap_or_default();
                StatusReport {
                    status: ProbeStatus::Ok,
                    chain_id,
                    network,
                    detail: StatusDetail::Healthy {
                        endpoint: handle.masked_endpoint(),
                        block_number,
                        gas_price: gas_price.to_string(),
                        currency_symbol,
                        is_connected: true,
                        peer_count,
                    },
                }
            }
            Err(e) => {
                self.cache.invalidate(chain_id);
                StatusReport::failed(chain_id, network, &e)
            }
        }
    }

    async fn collect_status(handle: &ConnectionHandle) -> AppResult<(u64, u128, Option<u64>)> {
        let rpc = handle.rpc();
        let block_number = rpc.block_number().await?;
        let gas_price = rpc.gas_price().await?;
        handle.verify_chain_id().await?;
        let peer_count = rpc.peer_count().await.ok();
        Ok((block_number, gas_price, peer_count))
    }

    /// Drop the cached handle for a chain (e.g. after a failed call on it)
    pub fn invalidate(&self, chain_id: u64) -> bool {
        self.cache.invalidate(chain_id)
    }

    pub fn cached_endpoint(&self, chain_id: u64) -> Option<String> {
        self.cache.peek_endpoint(chain_id)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
