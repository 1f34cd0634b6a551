//! Providers Module - External data sources
//!
//! JSON-RPC endpoints, the inference endpoint and wallet transaction sources.

pub mod inference;
pub mod rpc;
pub mod transactions;

pub use inference::{InferenceClient, OpenAiInferenceClient, UnconfiguredInference};
pub use rpc::{mask_url, RpcProvider};
pub use transactions::{RpcTransactionSource, StaticTransactionSource, TransactionSource};
