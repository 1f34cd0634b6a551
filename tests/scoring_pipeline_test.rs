//! End-to-end scoring against mock RPC nodes and a scripted inference client

mod common;

use chain_sentinel::core::ai_analysis::AiAnalyzer;
use chain_sentinel::models::config::RateLimitConfig;
use chain_sentinel::{
    ConnectionManager, ErrorCode, FindingKind, NetworkProfile, NetworkRegistry, ScanReport,
    ScoringPipeline, WalletWeights,
};
use common::{mount_node, mount_node_with_block, profile, rpc_method, ScriptedInference, WALLET};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{any, body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VULNERABLE_BANK: &str = r#"
pragma solidity ^0.4.24;
contract Bank {
    mapping(address => uint) balances;
    address owner;
    function withdraw(uint amount) public {
        require(tx.origin == owner);
        msg.sender.call.value(amount)();
        balances[msg.sender] -= amount;
    }
}
"#;

fn limits() -> RateLimitConfig {
    RateLimitConfig {
        max_requests: 50,
        window: Duration::from_secs(60),
    }
}

fn pipeline(server: &MockServer, chain_id: u64, inference: Arc<ScriptedInference>) -> ScoringPipeline {
    pipeline_for(profile(chain_id, vec![server.uri()]), inference)
}

fn pipeline_for(profile: NetworkProfile, inference: Arc<ScriptedInference>) -> ScoringPipeline {
    let registry = NetworkRegistry::new([profile]);
    let manager = Arc::new(ConnectionManager::new(Arc::new(registry)));
    ScoringPipeline::new(manager, AiAnalyzer::new(inference, limits()))
}

async fn count_calls(server: &MockServer, rpc_method: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| String::from_utf8_lossy(&r.body).contains(rpc_method))
        .count()
}

#[tokio::test]
async fn test_contract_scan_combines_local_and_ai() {
    let server = MockServer::start().await;
    mount_node(&server, 1).await;
    let inference = Arc::new(ScriptedInference::replying(json!({
        "risk_score": 0.9,
        "vulnerabilities": [
            {"type": "Reentrancy", "description": "state written after external call", "severity": "critical"}
        ]
    })));

    let token = CancellationToken::new();
    let result = pipeline(&server, 1, inference.clone())
        .score_contract(VULNERABLE_BANK, 1, &token)
        .await
        .unwrap();

    assert!((result.local_score - 1.0).abs() < 1e-9);
    assert!((result.risk_score - 0.94).abs() < 1e-9);
    assert!(result.ai_available);

    let kinds: Vec<FindingKind> = result.findings.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FindingKind::Reentrancy,
            FindingKind::MissingOverflowGuard,
            FindingKind::UnsafeOriginCheck,
            FindingKind::AiReported,
        ]
    );
    assert_eq!(result.recommendations.len(), 3);
    assert!(inference.system_prompts()[0].contains("Test Network 1"));

    let report = ScanReport::from_result(&result);
    assert_eq!(report.total_findings, 4);
    assert_eq!(report.critical_findings.len(), 3);
}

#[tokio::test]
async fn test_contract_scan_ai_failure_assumes_worst_case() {
    let server = MockServer::start().await;
    mount_node(&server, 1).await;
    let inference = Arc::new(ScriptedInference::failing());

    // reentrancy + unchecked call + no SafeMath + tx.origin = 1.3 before clamping
    let source = r#"
        contract Risky {
            function a() public { msg.sender.call.value(1)(); }
            function b(address t) public { t.call{value: 1}("ping"); }
            function c() public { require(tx.origin == address(0)); }
        }
    "#;
    let token = CancellationToken::new();
    let result = pipeline(&server, 1, inference.clone())
        .score_contract(source, 1, &token)
        .await
        .unwrap();

    assert_eq!(inference.calls(), 1);
    assert!(!result.ai_available);
    assert_eq!(result.ai_score, 1.0);
    assert!((result.risk_score - 1.0).abs() < 1e-9);
    assert_eq!(result.findings.len(), 4);
    assert!(result.findings.iter().all(|f| f.kind.is_local()));
}

#[tokio::test]
async fn test_contract_scan_unreachable_network_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.1})));

    let token = CancellationToken::new();
    let err = pipeline(&server, 1, inference.clone())
        .score_contract("contract A {}", 1, &token)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::RpcEndpointsExhausted);
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn test_contract_scan_forces_one_reconnect_after_failed_sweep() {
    let server = MockServer::start().await;
    // fails every attempt of the first sweep, then recovers
    rpc_method("web3_clientVersion")
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_node(&server, 1).await;
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.1})));

    let token = CancellationToken::new();
    let pipeline = pipeline(&server, 1, inference.clone());
    let result = pipeline.score_contract("contract A {}", 1, &token).await.unwrap();

    assert!(result.ai_available);
    assert_eq!(inference.calls(), 1);
    assert_eq!(count_calls(&server, "web3_clientVersion").await, 4);
    assert_eq!(pipeline.manager().cached_endpoint(1), Some(server.uri()));
}

#[tokio::test]
async fn test_contract_scan_chain_mismatch_is_not_retried() {
    let server = MockServer::start().await;
    mount_node(&server, 56).await;
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.1})));

    let token = CancellationToken::new();
    let err = pipeline_for(profile(1, vec![server.uri()]), inference.clone())
        .score_contract("contract A {}", 1, &token)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ChainIdMismatch);
    assert_eq!(count_calls(&server, "eth_chainId").await, 1);
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn test_contract_scan_cancelled() {
    let server = MockServer::start().await;
    mount_node(&server, 1).await;
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.1})));

    let token = CancellationToken::new();
    token.cancel();
    let err = pipeline(&server, 1, inference)
        .score_contract("contract A {}", 1, &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_wallet_scan_ai_failure_scores_point_three() {
    let server = MockServer::start().await;
    mount_node_with_block(
        &server,
        56,
        json!([{
            "hash": "0x01",
            "from": WALLET,
            "to": "0x0000000000000000000000000000000000000001",
            "value": "0x0",
            "blockNumber": "0x12d687",
            "input": "0x"
        }]),
    )
    .await;
    let inference = Arc::new(ScriptedInference::failing());

    let token = CancellationToken::new();
    let result = pipeline(&server, 56, inference.clone())
        .score_wallet(WALLET, 56, None, &token)
        .await
        .unwrap();

    assert!((result.risk_score - 0.3).abs() < 1e-9);
    assert_eq!(result.ai_score, 0.5);
    assert!(result.findings.is_empty());
    assert_eq!(inference.calls(), 1);
}

#[tokio::test]
async fn test_wallet_scan_custom_weights() {
    let server = MockServer::start().await;
    mount_node(&server, 1).await;
    let inference = Arc::new(ScriptedInference::replying(json!({
        "risk_score": 0.8,
        "suspicious_patterns": ["Interacts with a known mixer"]
    })));

    let token = CancellationToken::new();
    let weights = WalletWeights { heuristic: 0.0, ai: 1.0 };
    let result = pipeline(&server, 1, inference)
        .score_wallet(WALLET, 1, Some(weights), &token)
        .await
        .unwrap();

    assert!((result.risk_score - 0.8).abs() < 1e-9);
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].kind, FindingKind::AiReported);
    assert!(result.recommendations.is_empty());
}

#[tokio::test]
async fn test_wallet_scan_survives_transaction_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.2})));

    let token = CancellationToken::new();
    let result = pipeline(&server, 1, inference)
        .score_wallet(WALLET, 1, None, &token)
        .await
        .unwrap();
    assert!((result.risk_score - 0.12).abs() < 1e-9);
}

#[tokio::test]
async fn test_wallet_scan_drops_handle_when_block_fetch_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_getBlockByNumber",
            "params": ["latest", true]
        })))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_node(&server, 1).await;
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.5})));

    let token = CancellationToken::new();
    let pipeline = pipeline(&server, 1, inference);
    let result = pipeline.score_wallet(WALLET, 1, None, &token).await.unwrap();

    // scan continues with no activity
    assert!((result.risk_score - 0.3).abs() < 1e-9);
    assert!(pipeline.manager().cached_endpoint(1).is_none());
}

#[tokio::test]
async fn test_wallet_scan_cancel_interrupts_connection_backoff() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let slow_retry = NetworkProfile::custom(1, "Slow Network", vec![server.uri()])
        .with_retry(2, Duration::from_secs(3))
        .with_timeout(Duration::from_secs(2));
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.2})));
    let pipeline = pipeline_for(slow_retry, inference.clone());

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let err = pipeline.score_wallet(WALLET, 1, None, &token).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(inference.calls(), 0);
}

#[tokio::test]
async fn test_wallet_scan_rejects_bad_input_before_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.2})));
    let pipeline = pipeline(&server, 1, inference.clone());
    let token = CancellationToken::new();

    let err = pipeline.score_wallet("0x1234", 1, None, &token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAddress);

    let bad_checksum = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96046";
    let err = pipeline.score_wallet(bad_checksum, 1, None, &token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAddress);

    let err = pipeline.score_wallet(WALLET, 424242, None, &token).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigUnsupportedChain);

    assert_eq!(inference.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fifty_first_call_is_delayed_not_dropped() {
    let inference = Arc::new(ScriptedInference::replying(json!({"risk_score": 0.1})));
    let analyzer = AiAnalyzer::new(inference.clone(), limits());
    let token = CancellationToken::new();
    let start = Instant::now();

    for _ in 0..50 {
        analyzer.analyze_contract("contract A {}", "Ethereum", &token).await.unwrap();
    }
    assert!(start.elapsed() < Duration::from_secs(1));

    analyzer.analyze_contract("contract A {}", "Ethereum", &token).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(inference.calls(), 51);
}
