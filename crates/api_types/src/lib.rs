use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External account identifier: a `0x`-prefixed hex string, kept lowercase.
///
/// The client treats accounts as opaque; the ledger is the authority on
/// whether an account actually exists. Deserialization goes through
/// [`AccountId::parse`], so a payload carrying a malformed account is a
/// decode error.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parses and normalizes an account string (config files, CLI flags,
    /// wire payloads).
    ///
    /// Requires the `0x` prefix and a non-empty hex body; the length is not
    /// checked so short dev-node accounts stay usable.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let Some(body) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) else {
            return Err(format!("\"{raw}\" is not a 0x-prefixed account"));
        };
        if body.is_empty() || !body.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("\"{raw}\" contains non-hex characters"));
        }
        Ok(Self(format!("0x{}", body.to_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened `0x1f42…23aa` form for status bars and labels.
    pub fn short(&self) -> String {
        if self.0.len() <= 12 {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl TryFrom<String> for AccountId {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub mod item {
    use super::*;

    /// Identifier assigned by the ledger at creation, stable for the life of
    /// the item.
    ///
    /// The contract renders its internal counter in decimal but clients never
    /// interpret the value.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ItemId(String);

    impl ItemId {
        pub fn new(raw: impl Into<String>) -> Self {
            Self(raw.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for ItemId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// A task record as stored on the ledger.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Item {
        pub id: ItemId,
        pub content: String,
        pub completed: bool,
        /// Account that created the item; never changes.
        pub creator: AccountId,
    }
}

pub mod call {
    use super::item::ItemId;
    use super::*;

    /// A mutating contract call, the complete write schema of the task
    /// ledger.
    ///
    /// Serialized as `{"call": "<method>", "args": {...}}` inside a
    /// submission.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "call", content = "args", rename_all = "camelCase")]
    pub enum LedgerCall {
        CreateItem { content: String },
        UpdateItem { id: ItemId, content: String },
        ToggleCompleted { id: ItemId },
        DeleteItem { id: ItemId },
    }

    impl LedgerCall {
        /// Contract method name, used for dispatch and log lines.
        pub fn method_name(&self) -> &'static str {
            match self {
                Self::CreateItem { .. } => "createItem",
                Self::UpdateItem { .. } => "updateItem",
                Self::ToggleCompleted { .. } => "toggleCompleted",
                Self::DeleteItem { .. } => "deleteItem",
            }
        }
    }
}

pub mod tx {
    use super::*;

    /// Handle returned by a successful submission; confirmation is tracked by
    /// hash.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TxHash(String);

    impl TxHash {
        pub fn new(raw: impl Into<String>) -> Self {
            Self(raw.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for TxHash {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TxStatus {
        /// Accepted by the node, not yet final.
        Pending,
        /// Effect guaranteed visible to subsequent reads.
        Confirmed,
        /// Refused by the contract; the receipt's `reason` carries the
        /// ledger's message.
        Rejected,
    }

    impl TxStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Pending => "pending",
                Self::Confirmed => "confirmed",
                Self::Rejected => "rejected",
            }
        }
    }

    /// Receipt reported by the node for a submitted transaction.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TxReceipt {
        pub hash: TxHash,
        pub status: TxStatus,
        pub reason: Option<String>,
    }
}

pub mod rpc {
    use super::call::LedgerCall;
    use super::item::Item;
    use super::tx::{TxHash, TxReceipt};
    use super::*;

    pub const JSONRPC_VERSION: &str = "2.0";

    /// Node methods the client speaks.
    pub const METHOD_LIST_ITEMS: &str = "ledger_listItems";
    pub const METHOD_SUBMIT: &str = "ledger_submit";
    pub const METHOD_RECEIPT: &str = "ledger_receipt";

    /// Standard JSON-RPC 2.0 error codes.
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Server-reserved code the node uses when the contract refuses a call.
    pub const EXECUTION_REVERTED: i64 = -32000;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RpcRequest {
        pub jsonrpc: String,
        /// Correlation id; the node echoes it back.
        pub id: Uuid,
        pub method: String,
        pub params: serde_json::Value,
    }

    impl RpcRequest {
        pub fn new(method: &str, params: serde_json::Value) -> Self {
            Self {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id: Uuid::new_v4(),
                method: method.to_string(),
                params,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RpcResponse {
        pub jsonrpc: String,
        pub id: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub result: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<RpcError>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RpcError {
        pub code: i64,
        pub message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub data: Option<serde_json::Value>,
    }

    /// Params for [`METHOD_LIST_ITEMS`].
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ListItemsParams {
        pub contract: AccountId,
        pub owner: AccountId,
    }

    /// Result payload of [`METHOD_LIST_ITEMS`].
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ListItemsResult {
        pub items: Vec<Item>,
    }

    /// Params for [`METHOD_SUBMIT`].
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubmitParams {
        pub contract: AccountId,
        pub from: AccountId,
        #[serde(flatten)]
        pub call: LedgerCall,
    }

    /// Result payload of [`METHOD_SUBMIT`].
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubmitResult {
        pub hash: TxHash,
    }

    /// Params for [`METHOD_RECEIPT`].
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptParams {
        pub hash: TxHash,
    }

    /// Result payload of [`METHOD_RECEIPT`]; `receipt` is absent when the
    /// node has never seen the hash.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptResult {
        pub receipt: Option<TxReceipt>,
    }
}
