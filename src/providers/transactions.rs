//! Transaction Sources
//!
//! Where wallet scans get their recent activity from. The RPC-backed source
//! scans the latest block's full transaction list for the address; it is a
//! deliberately shallow window and callers treat failures as "no activity".

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::connection::ConnectionManager;
use crate::models::errors::AppResult;
use crate::models::types::TransactionSummary;
use crate::providers::rpc::{parse_hex_u128, parse_hex_u64, RpcTransaction};

#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Recent transactions sent from or to `address` on `chain_id`.
    /// Sources that touch the network stop at `cancel`.
    async fn recent_transactions(
        &self,
        address: &str,
        chain_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<TransactionSummary>>;
}

/// Latest-block scan through a verified connection
pub struct RpcTransactionSource {
    manager: Arc<ConnectionManager>,
}

impl RpcTransactionSource {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }
}

fn involves(tx: &RpcTransaction, address: &str) -> bool {
    tx.from.eq_ignore_ascii_case(address)
        || tx
            .to
            .as_deref()
            .map(|to| to.eq_ignore_ascii_case(address))
            .unwrap_or(false)
}

fn summarize(tx: RpcTransaction) -> TransactionSummary {
    let value = parse_hex_u128(&tx.value).unwrap_or(0);
    let has_input = {
        let data = tx.input.trim_start_matches("0x");
        !data.is_empty()
    };
    TransactionSummary {
        hash: tx.hash,
        from: tx.from,
        to: tx.to,
        value: value.to_string(),
        block_number: tx.block_number.as_deref().and_then(|n| parse_hex_u64(n).ok()),
        has_input,
    }
}

#[async_trait]
impl TransactionSource for RpcTransactionSource {
    async fn recent_transactions(
        &self,
        address: &str,
        chain_id: u64,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<TransactionSummary>> {
        let handle = self.manager.acquire_with_cancel(chain_id, false, cancel).await?;
        let block = match handle.rpc().latest_block_with_transactions().await {
            Ok(block) => block,
            Err(e) => {
                warn!(
                    "⚠️ Block fetch failed on {}, dropping cached handle",
                    handle.masked_endpoint()
                );
                self.manager.invalidate(chain_id);
                return Err(e);
            }
        };
        let scanned = block.transactions.len();

        let matching: Vec<TransactionSummary> = block
            .transactions
            .into_iter()
            .filter(|tx| involves(tx, address))
            .map(summarize)
            .collect();

        debug!(
            chain_id,
            scanned,
            matched = matching.len(),
            "Scanned latest block for wallet activity"
        );
        Ok(matching)
    }
}

/// Fixed transaction list, for offline use and tests
#[derive(Debug, Clone, Default)]
pub struct StaticTransactionSource {
    transactions: Vec<TransactionSummary>,
}

impl StaticTransactionSource {
    pub fn new(transactions: Vec<TransactionSummary>) -> Self {
        Self { transactions }
    }
}

#[async_trait]
impl TransactionSource for StaticTransactionSource {
    async fn recent_transactions(
        &self,
        address: &str,
        _chain_id: u64,
        _cancel: &CancellationToken,
    ) -> AppResult<Vec<TransactionSummary>> {
        Ok(self
            .transactions
            .iter()
            .filter(|tx| {
                tx.from.eq_ignore_ascii_case(address)
                    || tx
                        .to
                        .as_deref()
                        .map(|to| to.eq_ignore_ascii_case(address))
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
