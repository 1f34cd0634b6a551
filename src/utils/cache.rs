//! Connection Handle Cache
//!
//! Thread-safe map of chain id to the last verified connection handle.
//! DashMap shards the locking, so scans on different chains never contend.
//!
//! - One handle per chain id, last writer wins
//! - Cache HIT/MISS counters for monitoring
//! - No TTL: staleness is detected by the liveness probe on read

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::connection::ConnectionHandle;

#[derive(Clone, Default)]
pub struct HandleCache {
    /// chain id -> verified handle
    store: Arc<DashMap<u64, ConnectionHandle>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl HandleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a handle. Counts a hit or miss; liveness is the caller's concern.
    pub fn get(&self, chain_id: u64) -> Option<ConnectionHandle> {
        match self.store.get(&chain_id) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("✅ CACHE HIT: chain {} ({})", chain_id, entry.masked_endpoint());
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS: chain {}", chain_id);
                None
            }
        }
    }

    /// Store a handle, replacing any previous one for the same chain
    pub fn set(&self, handle: ConnectionHandle) {
        let chain_id = handle.chain_id();
        let endpoint = handle.masked_endpoint();
        if let Some(previous) = self.store.insert(chain_id, handle) {
            info!(
                "💾 CACHE REPLACE: chain {} {} -> {}",
                chain_id,
                previous.masked_endpoint(),
                endpoint
            );
        } else {
            info!("💾 CACHE SET: chain {} ({})", chain_id, endpoint);
        }
    }

    /// Evict the handle for a chain. Returns true if one was present.
    pub fn invalidate(&self, chain_id: u64) -> bool {
        let removed = self.store.remove(&chain_id).is_some();
        if removed {
            debug!("🗑️ CACHE INVALIDATE: chain {}", chain_id);
        }
        removed
    }

    /// Endpoint of the cached handle, without touching hit/miss counters
    pub fn peek_endpoint(&self, chain_id: u64) -> Option<String> {
        self.store.get(&chain_id).map(|h| h.endpoint().to_string())
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
