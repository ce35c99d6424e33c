//! JSON-RPC 2.0 client for the task ledger node.
//!
//! Speaks the `ledger_*` method family over HTTP POST and implements the
//! [`Ledger`] trait on top of it: one list read plus the submit-then-confirm
//! write handshake. `confirm` polls the node for a receipt, since the node
//! only reports a final status once the transaction has been sealed into a
//! block.

use std::time::Duration;

use api_types::AccountId;
use api_types::call::LedgerCall;
use api_types::item::Item;
use api_types::rpc::{
    ListItemsParams, ListItemsResult, METHOD_LIST_ITEMS, METHOD_RECEIPT, METHOD_SUBMIT,
    ReceiptParams, ReceiptResult, RpcRequest, RpcResponse, SubmitParams, SubmitResult,
};
use api_types::tx::{TxHash, TxReceipt, TxStatus};
use controller::{Ledger, LedgerError};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

const DEFAULT_RECEIPT_INTERVAL: Duration = Duration::from_millis(200);
const DEFAULT_RECEIPT_ATTEMPTS: u32 = 50;

/// [`Ledger`] backend bound to one node endpoint and one task contract.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RpcLedger {
    endpoint: Url,
    contract: AccountId,
    http: reqwest::Client,
    receipt_interval: Duration,
    receipt_attempts: u32,
}

impl RpcLedger {
    pub fn new(endpoint: &str, contract: AccountId) -> Result<Self, LedgerError> {
        let endpoint = Url::parse(endpoint).map_err(|err| {
            LedgerError::Transport(format!("invalid endpoint \"{endpoint}\": {err}"))
        })?;
        Ok(Self {
            endpoint,
            contract,
            http: reqwest::Client::new(),
            receipt_interval: DEFAULT_RECEIPT_INTERVAL,
            receipt_attempts: DEFAULT_RECEIPT_ATTEMPTS,
        })
    }

    /// Overrides how often and how many times `confirm` polls for a receipt
    /// before giving the transaction up as unconfirmed.
    pub fn with_receipt_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.receipt_interval = interval;
        self.receipt_attempts = attempts.max(1);
        self
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, LedgerError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|err| LedgerError::Decode(format!("{method} params: {err}")))?;
        let request = RpcRequest::new(method, params);
        tracing::debug!("calling {method} on {}", self.endpoint);

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| LedgerError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!(
                "node answered {method} with status {status}"
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|err| LedgerError::Decode(format!("{method}: {err}")))?;

        if let Some(error) = envelope.error {
            tracing::debug!("node rejected {method}: {} ({})", error.message, error.code);
            return Err(LedgerError::Rejected(error.message));
        }
        let Some(result) = envelope.result else {
            return Err(LedgerError::Decode(format!(
                "{method}: response carries neither result nor error"
            )));
        };
        serde_json::from_value(result)
            .map_err(|err| LedgerError::Decode(format!("{method}: {err}")))
    }
}

impl Ledger for RpcLedger {
    async fn list(&self, owner: &AccountId) -> Result<Vec<Item>, LedgerError> {
        let params = ListItemsParams {
            contract: self.contract.clone(),
            owner: owner.clone(),
        };
        let result: ListItemsResult = self.call(METHOD_LIST_ITEMS, &params).await?;
        Ok(result.items)
    }

    async fn submit(&self, from: &AccountId, call: LedgerCall) -> Result<TxHash, LedgerError> {
        let params = SubmitParams {
            contract: self.contract.clone(),
            from: from.clone(),
            call,
        };
        let result: SubmitResult = self.call(METHOD_SUBMIT, &params).await?;
        Ok(result.hash)
    }

    async fn confirm(&self, hash: &TxHash) -> Result<TxReceipt, LedgerError> {
        let params = ReceiptParams { hash: hash.clone() };
        for attempt in 0..self.receipt_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.receipt_interval).await;
            }
            let result: ReceiptResult = self.call(METHOD_RECEIPT, &params).await?;
            match result.receipt {
                Some(receipt) if receipt.status != TxStatus::Pending => return Ok(receipt),
                // No receipt yet, or still pending: the node may lag a few
                // blocks behind the submission.
                _ => {}
            }
        }
        Err(LedgerError::Unconfirmed(hash.clone()))
    }
}
