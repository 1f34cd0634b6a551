//! Shared fixtures: wiremock-backed JSON-RPC nodes and scripted inference

#![allow(dead_code)]

use async_trait::async_trait;
use chain_sentinel::{InferenceClient, NetworkProfile};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WALLET: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";

pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

pub fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": { "code": code, "message": message },
    }))
}

pub fn rpc_method(name: &str) -> wiremock::MockBuilder {
    Mock::given(method("POST")).and(body_partial_json(json!({ "method": name })))
}

/// Mount every method a healthy, fully synced node answers
pub async fn mount_node(server: &MockServer, chain_id: u64) {
    mount_node_with_block(server, chain_id, json!([])).await;
}

pub async fn mount_node_with_block(server: &MockServer, chain_id: u64, transactions: Value) {
    rpc_method("web3_clientVersion")
        .respond_with(rpc_result(json!("Geth/v1.13.0")))
        .mount(server)
        .await;
    rpc_method("eth_getBlockByNumber")
        .respond_with(rpc_result(json!({
            "number": "0x12d687",
            "hash": "0xabc",
            "transactions": transactions,
        })))
        .mount(server)
        .await;
    rpc_method("eth_chainId")
        .respond_with(rpc_result(json!(format!("0x{:x}", chain_id))))
        .mount(server)
        .await;
    rpc_method("eth_syncing")
        .respond_with(rpc_result(json!(false)))
        .mount(server)
        .await;
    rpc_method("eth_blockNumber")
        .respond_with(rpc_result(json!("0x12d687")))
        .mount(server)
        .await;
    rpc_method("eth_gasPrice")
        .respond_with(rpc_result(json!("0x3b9aca00")))
        .mount(server)
        .await;
    rpc_method("net_peerCount")
        .respond_with(rpc_result(json!("0x19")))
        .mount(server)
        .await;
}

/// Profile with millisecond backoff so retry paths run quickly
pub fn profile(chain_id: u64, urls: Vec<String>) -> NetworkProfile {
    NetworkProfile::custom(chain_id, format!("Test Network {}", chain_id), urls)
        .with_retry(3, Duration::from_millis(1))
        .with_timeout(Duration::from_secs(2))
}

/// Inference stand-in that replays a fixed reply (or failure) and counts calls
pub struct ScriptedInference {
    reply: Option<Value>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInference {
    pub fn replying(reply: Value) -> Self {
        Self {
            reply: Some(reply),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn system_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedInference {
    async fn complete(&self, system_prompt: &str, _user_prompt: &str) -> eyre::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(system_prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(eyre::eyre!("inference endpoint unavailable")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
