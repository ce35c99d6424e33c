use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_types::AccountId;
use api_types::call::LedgerCall;
use api_types::item::{Item, ItemId};
use api_types::rpc as wire;
use api_types::tx::{TxHash, TxReceipt, TxStatus};
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use controller::{Ledger, LedgerError};
use rpc::RpcLedger;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Scripted node behind the mock endpoint. It answers the `ledger_*` family
/// with whatever the test loaded into it.
#[derive(Default)]
struct NodeState {
    items: Vec<Item>,
    submits: Vec<serde_json::Value>,
    receipt_calls: usize,
    receipt_script: VecDeque<Receipt>,
    fallback_receipt: Receipt,
    reject_submit: Option<(i64, String)>,
    garble_lists: bool,
}

#[derive(Clone, Default)]
enum Receipt {
    Unknown,
    Pending,
    #[default]
    Confirmed,
    Rejected(&'static str),
}

async fn handle(
    State(state): State<Arc<Mutex<NodeState>>>,
    Json(request): Json<wire::RpcRequest>,
) -> Json<wire::RpcResponse> {
    let mut state = state.lock().unwrap();
    let outcome = match request.method.as_str() {
        wire::METHOD_LIST_ITEMS => list_items(&state, &request.params),
        wire::METHOD_SUBMIT => submit(&mut state, &request.params),
        wire::METHOD_RECEIPT => receipt(&mut state, &request.params),
        other => Err(wire::RpcError {
            code: wire::METHOD_NOT_FOUND,
            message: format!("unknown method {other}"),
            data: None,
        }),
    };
    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err)),
    };
    Json(wire::RpcResponse {
        jsonrpc: wire::JSONRPC_VERSION.to_string(),
        id: request.id,
        result,
        error,
    })
}

fn list_items(
    state: &NodeState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, wire::RpcError> {
    if state.garble_lists {
        return Ok(json!({ "todos": 3 }));
    }
    let params: wire::ListItemsParams = parse(params)?;
    let items: Vec<Item> = state
        .items
        .iter()
        .filter(|item| item.creator == params.owner)
        .cloned()
        .collect();
    Ok(json!(wire::ListItemsResult { items }))
}

fn submit(
    state: &mut NodeState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, wire::RpcError> {
    if let Some((code, message)) = state.reject_submit.clone() {
        return Err(wire::RpcError {
            code,
            message,
            data: None,
        });
    }
    state.submits.push(params.clone());
    Ok(json!(wire::SubmitResult {
        hash: TxHash::new("0xfeed01"),
    }))
}

fn receipt(
    state: &mut NodeState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, wire::RpcError> {
    let params: wire::ReceiptParams = parse(params)?;
    state.receipt_calls += 1;
    let script = state
        .receipt_script
        .pop_front()
        .unwrap_or(state.fallback_receipt.clone());
    let receipt = match script {
        Receipt::Unknown => None,
        Receipt::Pending => Some(TxReceipt {
            hash: params.hash.clone(),
            status: TxStatus::Pending,
            reason: None,
        }),
        Receipt::Confirmed => Some(TxReceipt {
            hash: params.hash.clone(),
            status: TxStatus::Confirmed,
            reason: None,
        }),
        Receipt::Rejected(reason) => Some(TxReceipt {
            hash: params.hash.clone(),
            status: TxStatus::Rejected,
            reason: Some(reason.to_string()),
        }),
    };
    Ok(json!(wire::ReceiptResult { receipt }))
}

fn parse<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, wire::RpcError> {
    serde_json::from_value(params.clone()).map_err(|err| wire::RpcError {
        code: wire::INVALID_PARAMS,
        message: err.to_string(),
        data: None,
    })
}

/// Binds the mock node on an ephemeral port and serves it in the background.
async fn spawn_node(state: Arc<Mutex<NodeState>>) -> String {
    let router = Router::new().route("/", post(handle)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            eprintln!("mock node failed: {err}");
        }
    });
    format!("http://{addr}/")
}

fn account(raw: &str) -> AccountId {
    AccountId::parse(raw).unwrap()
}

fn contract() -> AccountId {
    account("0x1f421f8d9743c32b31218dc3266cc14a128e23aa")
}

fn stored(owner: &AccountId, id: &str, content: &str) -> Item {
    Item {
        id: ItemId::new(id),
        content: content.to_string(),
        completed: false,
        creator: owner.clone(),
    }
}

#[test]
fn endpoint_must_be_a_valid_url() {
    let err = RpcLedger::new("not a url", contract()).unwrap_err();
    assert!(matches!(err, LedgerError::Transport(_)));
}

#[tokio::test]
async fn list_returns_items_for_the_requested_owner() {
    let state = Arc::new(Mutex::new(NodeState::default()));
    {
        let mut node = state.lock().unwrap();
        node.items.push(stored(&account("0xaaa"), "1", "water the plants"));
        node.items.push(stored(&account("0xbbb"), "2", "someone else's errand"));
    }
    let endpoint = spawn_node(Arc::clone(&state)).await;
    let ledger = RpcLedger::new(&endpoint, contract()).unwrap();

    let items = ledger.list(&account("0xaaa")).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "water the plants");
    assert_eq!(items[0].creator, account("0xaaa"));
}

#[tokio::test]
async fn submit_carries_the_contract_call_and_addresses() {
    let state = Arc::new(Mutex::new(NodeState::default()));
    let endpoint = spawn_node(Arc::clone(&state)).await;
    let ledger = RpcLedger::new(&endpoint, contract()).unwrap();

    let hash = ledger
        .submit(
            &account("0xAAA"),
            LedgerCall::CreateItem {
                content: "buy milk".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(hash, TxHash::new("0xfeed01"));

    let submits = state.lock().unwrap().submits.clone();
    assert_eq!(submits.len(), 1);
    assert_eq!(submits[0]["contract"], json!(contract()));
    assert_eq!(submits[0]["from"], json!("0xaaa"));
    assert_eq!(submits[0]["call"], json!("createItem"));
    assert_eq!(submits[0]["args"]["content"], json!("buy milk"));
}

#[tokio::test]
async fn confirm_polls_until_the_receipt_is_final() {
    let state = Arc::new(Mutex::new(NodeState::default()));
    state
        .lock()
        .unwrap()
        .receipt_script
        .extend([Receipt::Unknown, Receipt::Pending, Receipt::Confirmed]);
    let endpoint = spawn_node(Arc::clone(&state)).await;
    let ledger = RpcLedger::new(&endpoint, contract())
        .unwrap()
        .with_receipt_polling(Duration::from_millis(1), 10);

    let receipt = ledger.confirm(&TxHash::new("0xfeed01")).await.unwrap();

    assert_eq!(receipt.status, TxStatus::Confirmed);
    assert_eq!(receipt.hash, TxHash::new("0xfeed01"));
    assert_eq!(state.lock().unwrap().receipt_calls, 3);
}

#[tokio::test]
async fn confirm_gives_up_after_the_attempt_budget() {
    let state = Arc::new(Mutex::new(NodeState::default()));
    state.lock().unwrap().fallback_receipt = Receipt::Pending;
    let endpoint = spawn_node(Arc::clone(&state)).await;
    let ledger = RpcLedger::new(&endpoint, contract())
        .unwrap()
        .with_receipt_polling(Duration::from_millis(1), 3);

    let hash = TxHash::new("0xdead");
    let err = ledger.confirm(&hash).await.unwrap_err();

    assert!(matches!(err, LedgerError::Unconfirmed(ref lost) if *lost == hash));
    assert_eq!(state.lock().unwrap().receipt_calls, 3);
}

#[tokio::test]
async fn rejected_receipts_come_back_with_their_reason() {
    let state = Arc::new(Mutex::new(NodeState::default()));
    state
        .lock()
        .unwrap()
        .receipt_script
        .push_back(Receipt::Rejected("execution reverted: empty content"));
    let endpoint = spawn_node(Arc::clone(&state)).await;
    let ledger = RpcLedger::new(&endpoint, contract())
        .unwrap()
        .with_receipt_polling(Duration::from_millis(1), 3);

    let receipt = ledger.confirm(&TxHash::new("0xfeed01")).await.unwrap();

    assert_eq!(receipt.status, TxStatus::Rejected);
    assert_eq!(
        receipt.reason.as_deref(),
        Some("execution reverted: empty content")
    );
}

#[tokio::test]
async fn node_errors_surface_as_rejections() {
    let state = Arc::new(Mutex::new(NodeState::default()));
    state.lock().unwrap().reject_submit = Some((
        wire::EXECUTION_REVERTED,
        "execution reverted: not the creator".to_string(),
    ));
    let endpoint = spawn_node(Arc::clone(&state)).await;
    let ledger = RpcLedger::new(&endpoint, contract()).unwrap();

    let err = ledger
        .submit(&account("0xaaa"), LedgerCall::DeleteItem { id: ItemId::new("9") })
        .await
        .unwrap_err();

    match err {
        LedgerError::Rejected(message) => assert!(message.contains("not the creator")),
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_is_a_transport_error() {
    let router =
        Router::new().route("/", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    let ledger = RpcLedger::new(&format!("http://{addr}/"), contract()).unwrap();

    let err = ledger.list(&account("0xaaa")).await.unwrap_err();

    assert!(matches!(err, LedgerError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_node_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let ledger = RpcLedger::new(&format!("http://{addr}/"), contract()).unwrap();

    let err = ledger.list(&account("0xaaa")).await.unwrap_err();

    assert!(matches!(err, LedgerError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn malformed_result_is_a_decode_error() {
    let state = Arc::new(Mutex::new(NodeState::default()));
    state.lock().unwrap().garble_lists = true;
    let endpoint = spawn_node(Arc::clone(&state)).await;
    let ledger = RpcLedger::new(&endpoint, contract()).unwrap();

    let err = ledger.list(&account("0xaaa")).await.unwrap_err();

    assert!(matches!(err, LedgerError::Decode(_)), "got {err:?}");
}
