use std::future::Future;
use std::sync::Arc;

use api_types::AccountId;
use api_types::call::LedgerCall;
use api_types::item::{Item, ItemId};
use api_types::tx::{TxHash, TxReceipt, TxStatus};
use thiserror::Error;

use crate::{ControllerError, ResultController};

/// Transport-level failures reported by a [`Ledger`] backend.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The node or the contract refused the call.
    #[error("rejected: {0}")]
    Rejected(String),
    /// The node could not be reached.
    #[error("transport: {0}")]
    Transport(String),
    /// The node answered with a payload the client could not read.
    #[error("decode: {0}")]
    Decode(String),
    /// The submission was accepted but never reached a final status.
    #[error("transaction {0} not confirmed")]
    Unconfirmed(TxHash),
}

/// The remote task ledger: one read plus a two-phase write entry point.
///
/// Writes are submit-then-confirm. A submission only hands the call to the
/// node; its effect is guaranteed visible to [`Ledger::list`] once a
/// confirmed receipt comes back.
pub trait Ledger: Send + Sync {
    /// Returns every item created by `owner`. All-or-nothing.
    fn list(
        &self,
        owner: &AccountId,
    ) -> impl Future<Output = Result<Vec<Item>, LedgerError>> + Send;

    /// Hands a signed call to the node; returns the pending transaction.
    fn submit(
        &self,
        from: &AccountId,
        call: LedgerCall,
    ) -> impl Future<Output = Result<TxHash, LedgerError>> + Send;

    /// Waits for a final receipt for `hash`.
    fn confirm(
        &self,
        hash: &TxHash,
    ) -> impl Future<Output = Result<TxReceipt, LedgerError>> + Send;
}

impl<L: Ledger> Ledger for Arc<L> {
    fn list(
        &self,
        owner: &AccountId,
    ) -> impl Future<Output = Result<Vec<Item>, LedgerError>> + Send {
        L::list(self, owner)
    }

    fn submit(
        &self,
        from: &AccountId,
        call: LedgerCall,
    ) -> impl Future<Output = Result<TxHash, LedgerError>> + Send {
        L::submit(self, from, call)
    }

    fn confirm(
        &self,
        hash: &TxHash,
    ) -> impl Future<Output = Result<TxReceipt, LedgerError>> + Send {
        L::confirm(self, hash)
    }
}

/// Typed gateway to the ledger for one bound account.
///
/// Rebinding to another account means constructing a fresh client; the
/// account inside an existing client never changes.
#[derive(Debug)]
pub struct LedgerClient<L> {
    ledger: Arc<L>,
    account: AccountId,
}

impl<L> Clone for LedgerClient<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            account: self.account.clone(),
        }
    }
}

impl<L: Ledger> LedgerClient<L> {
    pub fn new(ledger: Arc<L>, account: AccountId) -> Self {
        Self { ledger, account }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Fetches the full item set for the bound account.
    pub async fn list(&self) -> ResultController<Vec<Item>> {
        self.ledger
            .list(&self.account)
            .await
            .map_err(|err| ControllerError::Read(err.to_string()))
    }

    pub async fn create(&self, content: &str) -> ResultController<()> {
        require_content(content)?;
        self.submit_confirmed(LedgerCall::CreateItem {
            content: content.to_string(),
        })
        .await
    }

    pub async fn update(&self, id: &ItemId, content: &str) -> ResultController<()> {
        require_content(content)?;
        self.submit_confirmed(LedgerCall::UpdateItem {
            id: id.clone(),
            content: content.to_string(),
        })
        .await
    }

    pub async fn toggle_completion(&self, id: &ItemId) -> ResultController<()> {
        self.submit_confirmed(LedgerCall::ToggleCompleted { id: id.clone() })
            .await
    }

    pub async fn delete(&self, id: &ItemId) -> ResultController<()> {
        self.submit_confirmed(LedgerCall::DeleteItem { id: id.clone() })
            .await
    }

    /// Runs both phases of a write. Success requires a confirmed receipt;
    /// submitted-but-unconfirmed is reported as its own failure.
    async fn submit_confirmed(&self, call: LedgerCall) -> ResultController<()> {
        let method = call.method_name();
        let hash = self
            .ledger
            .submit(&self.account, call)
            .await
            .map_err(|err| ControllerError::Submit(format!("{method}: {err}")))?;
        let receipt = self
            .ledger
            .confirm(&hash)
            .await
            .map_err(|err| {
                ControllerError::Submit(format!("{method} submitted but not confirmed: {err}"))
            })?;
        match receipt.status {
            TxStatus::Confirmed => Ok(()),
            TxStatus::Rejected => Err(ControllerError::Submit(format!(
                "{method} rejected by the ledger: {}",
                receipt.reason.as_deref().unwrap_or("no reason given")
            ))),
            TxStatus::Pending => Err(ControllerError::Submit(format!(
                "{method} submitted but still pending"
            ))),
        }
    }
}

fn require_content(content: &str) -> ResultController<()> {
    if content.trim().is_empty() {
        return Err(ControllerError::Validation(
            "content must not be empty".to_string(),
        ));
    }
    Ok(())
}
