//! End-to-end tests of `EvmRpcClient` against an in-process JSON-RPC node.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use chaingate_chain::{ChainAnswer, ChainError, ChainQueryPort, EvmRpcClient, EvmRpcConfig};
use chaingate_types::{ContractDefinition, ContractId, RoleId, TxHash, WalletAddress};

const WALLET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const CONTRACT: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

#[derive(Default)]
struct MockNode {
    latest: u64,
    /// block number -> transactions as (hash, from, to)
    txs: HashMap<u64, Vec<(String, String, String)>>,
    /// tx hash -> receipt status
    receipts: HashMap<String, &'static str>,
    /// requested block -> number the node claims it has
    renumber: HashMap<u64, u64>,
}

impl MockNode {
    fn answer(&self, req: &Value) -> Value {
        let id = req["id"].clone();
        let result = match req["method"].as_str().unwrap_or_default() {
            "eth_blockNumber" => json!(format!("0x{:x}", self.latest)),
            "eth_getBlockByNumber" => {
                let raw = req["params"][0].as_str().unwrap_or("0x0");
                let n = u64::from_str_radix(raw.trim_start_matches("0x"), 16).unwrap();
                if n > self.latest {
                    Value::Null
                } else {
                    let txs: Vec<Value> = self
                        .txs
                        .get(&n)
                        .map(|list| {
                            list.iter()
                                .map(|(h, f, t)| json!({"hash": h, "from": f, "to": t}))
                                .collect()
                        })
                        .unwrap_or_default();
                    let number = match self.renumber.get(&n) {
                        Some(claimed) => format!("0x{claimed:x}"),
                        None => raw.to_string(),
                    };
                    json!({"number": number, "transactions": txs})
                }
            }
            "eth_getTransactionReceipt" => {
                let hash = req["params"][0].as_str().unwrap_or_default();
                match self.receipts.get(hash) {
                    Some(status) => json!({"status": status}),
                    None => Value::Null,
                }
            }
            other => {
                return json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": format!("no method {other}")}})
            }
        };
        json!({"jsonrpc": "2.0", "id": id, "result": result})
    }
}

async fn rpc(State(node): State<Arc<MockNode>>, Json(body): Json<Value>) -> Json<Value> {
    match body {
        // Answer batches in reverse to check the client reorders by id.
        Value::Array(reqs) => Json(Value::Array(
            reqs.iter().rev().map(|r| node.answer(r)).collect(),
        )),
        single => Json(node.answer(&single)),
    }
}

async fn spawn_node(node: MockNode) -> String {
    let app = Router::new().route("/", post(rpc)).with_state(Arc::new(node));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn hash(n: u8) -> String {
    format!("0x{}", format!("{:02x}", n).repeat(32))
}

fn contract(rpc_url: String) -> ContractDefinition {
    ContractDefinition {
        id: ContractId::new("contract1").unwrap(),
        name: "Contract 1".into(),
        address: WalletAddress::parse(CONTRACT).unwrap(),
        role_id: RoleId::new("42").unwrap(),
        rpc_url,
        verification_channel_id: None,
        min_confirmations: None,
    }
}

fn client(search_blocks: u64) -> EvmRpcClient {
    EvmRpcClient::new(EvmRpcConfig {
        search_blocks,
        block_batch: 4,
        request_timeout: Duration::from_secs(2),
    })
    .unwrap()
}

fn wallet() -> WalletAddress {
    WalletAddress::parse(WALLET).unwrap()
}

#[tokio::test]
async fn finds_most_recent_transaction_with_confirmations() {
    let mut node = MockNode {
        latest: 100,
        ..Default::default()
    };
    node.txs.insert(90, vec![(hash(1), WALLET.into(), CONTRACT.into())]);
    node.txs.insert(98, vec![(hash(2), WALLET.into(), CONTRACT.into())]);
    node.receipts.insert(hash(1), "0x1");
    node.receipts.insert(hash(2), "0x1");
    let url = spawn_node(node).await;

    let answer = client(50).query(&wallet(), &contract(url)).await.unwrap();
    assert_eq!(
        answer,
        ChainAnswer::Found {
            tx_hash: TxHash::parse(&hash(2)).unwrap(),
            block_number: 98,
            confirmations: 3,
        }
    );
}

#[tokio::test]
async fn transaction_outside_window_is_not_found() {
    let mut node = MockNode {
        latest: 100,
        ..Default::default()
    };
    node.txs.insert(80, vec![(hash(1), WALLET.into(), CONTRACT.into())]);
    node.receipts.insert(hash(1), "0x1");
    let url = spawn_node(node).await;

    // Window covers blocks 91..=100.
    let answer = client(10).query(&wallet(), &contract(url)).await.unwrap();
    assert_eq!(answer, ChainAnswer::NotFound);
}

#[tokio::test]
async fn reverted_transaction_is_skipped_for_older_success() {
    let mut node = MockNode {
        latest: 20,
        ..Default::default()
    };
    node.txs.insert(19, vec![(hash(2), WALLET.into(), CONTRACT.into())]);
    node.txs.insert(12, vec![(hash(1), WALLET.into(), CONTRACT.into())]);
    node.receipts.insert(hash(2), "0x0");
    node.receipts.insert(hash(1), "0x1");
    let url = spawn_node(node).await;

    match client(20).query(&wallet(), &contract(url)).await.unwrap() {
        ChainAnswer::Found {
            block_number,
            confirmations,
            ..
        } => {
            assert_eq!(block_number, 12);
            assert_eq!(confirmations, 9);
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[tokio::test]
async fn window_larger_than_chain_stops_at_genesis() {
    let mut node = MockNode {
        latest: 3,
        ..Default::default()
    };
    node.txs.insert(0, vec![(hash(7), WALLET.into(), CONTRACT.into())]);
    node.receipts.insert(hash(7), "0x1");
    let url = spawn_node(node).await;

    let answer = client(10_000).query(&wallet(), &contract(url)).await.unwrap();
    assert!(matches!(answer, ChainAnswer::Found { block_number: 0, confirmations: 4, .. }));
}

#[tokio::test]
async fn block_above_head_is_an_invalid_response() {
    let mut node = MockNode {
        latest: 50,
        ..Default::default()
    };
    node.txs.insert(49, vec![(hash(3), WALLET.into(), CONTRACT.into())]);
    node.receipts.insert(hash(3), "0x1");
    node.renumber.insert(49, 60);
    let url = spawn_node(node).await;

    let result = client(10).query(&wallet(), &contract(url)).await;
    assert!(matches!(result, Err(ChainError::InvalidResponse(_))), "{result:?}");
}

#[tokio::test]
async fn latest_block_probe() {
    let url = spawn_node(MockNode {
        latest: 0x1b4,
        ..Default::default()
    })
    .await;
    assert_eq!(client(1).latest_block(&contract(url)).await.unwrap(), 436);
}

#[tokio::test]
async fn unreachable_endpoint_is_an_error_not_a_miss() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(10)
        .query(&wallet(), &contract(format!("http://{addr}/")))
        .await;
    assert!(matches!(result, Err(ChainError::Unreachable(_))), "{result:?}");
}
