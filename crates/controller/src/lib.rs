//! Synchronization controller for a ledger-backed task list.
//!
//! The ledger is the single authority; the controller only keeps a local
//! cache of it, refreshed wholesale after every write. Commands are
//! fire-and-forget: callers spawn them, keep drawing, and read the outcome
//! back through the projections ([`Controller::items`], [`Controller::busy`],
//! [`Controller::last_error`]). One gated operation runs at a time, and a
//! wallet switch that lands mid-operation discards the stale read and
//! reloads under the new account before the gate opens again.

use std::sync::{Arc, Mutex, MutexGuard};

use api_types::AccountId;
use api_types::item::{Item, ItemId};
use tokio::sync::watch;

pub use edit::EditSession;
pub use error::ControllerError;
pub use gate::{GatePermit, MutationGate};
pub use identity::{IdentityError, IdentityProvider};
pub use ledger::{Ledger, LedgerClient, LedgerError};

mod edit;
mod error;
mod gate;
mod identity;
mod ledger;

type ResultController<T> = Result<T, ControllerError>;

/// State guarded by the controller mutex. The lock is only ever held across
/// synchronous sections, never across an await.
#[derive(Debug)]
struct Inner<L> {
    /// Gateway for the currently bound account, `None` while disconnected.
    client: Option<LedgerClient<L>>,
    /// Bumped on every rebind; in-flight reads compare against it before
    /// installing their result.
    epoch: u64,
    items: Vec<Item>,
    last_error: Option<String>,
    edit: EditSession,
}

/// Client-side coordinator between one wallet, one ledger and one cached
/// item list.
///
/// Shared by wrapping in an [`Arc`]; every command takes `&self`.
pub struct Controller<L, P> {
    ledger: Arc<L>,
    provider: P,
    gate: MutationGate,
    inner: Mutex<Inner<L>>,
    account_rx: Mutex<watch::Receiver<Option<AccountId>>>,
    revision: watch::Sender<u64>,
}

impl<L: Ledger, P: IdentityProvider> Controller<L, P> {
    pub fn new(ledger: L, provider: P) -> Self {
        let account_rx = provider.subscribe();
        Self {
            ledger: Arc::new(ledger),
            provider,
            gate: MutationGate::new(),
            inner: Mutex::new(Inner {
                client: None,
                epoch: 0,
                items: Vec::new(),
                last_error: None,
                edit: EditSession::default(),
            }),
            account_rx: Mutex::new(account_rx),
            revision: watch::Sender::new(0),
        }
    }

    /// The account every cached item belongs to, `None` while disconnected.
    pub fn account(&self) -> Option<AccountId> {
        self.inner()
            .client
            .as_ref()
            .map(|client| client.account().clone())
    }

    /// Snapshot of the cached item list, in ledger order.
    pub fn items(&self) -> Vec<Item> {
        self.inner().items.clone()
    }

    /// Whether a gated operation is currently in flight.
    pub fn busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Message of the most recent failed attempt, cleared when a new attempt
    /// starts.
    pub fn last_error(&self) -> Option<String> {
        self.inner().last_error.clone()
    }

    /// The item open for editing and its draft, if a session is open.
    pub fn editing(&self) -> Option<(ItemId, String)> {
        self.inner().edit.snapshot()
    }

    /// Change feed for the projections; bumped whenever any of them may have
    /// moved. Presentation layers redraw on it instead of polling.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Requests an account from the wallet, binds it and loads its list.
    pub async fn connect(&self) -> ResultController<()> {
        self.begin_attempt();
        let result = self.run_connect().await;
        self.finish_attempt(result)
    }

    /// Reloads the cache from the ledger without writing anything.
    pub async fn refresh(&self) -> ResultController<()> {
        self.begin_attempt();
        let result = self.run_refresh().await;
        self.finish_attempt(result)
    }

    pub async fn create_item(&self, content: &str) -> ResultController<()> {
        self.begin_attempt();
        let result = self.run_create(content).await;
        self.finish_attempt(result)
    }

    pub async fn toggle_completion(&self, id: &ItemId) -> ResultController<()> {
        self.begin_attempt();
        let result = self.run_toggle(id).await;
        self.finish_attempt(result)
    }

    pub async fn delete_item(&self, id: &ItemId) -> ResultController<()> {
        self.begin_attempt();
        let result = self.run_delete(id).await;
        self.finish_attempt(result)
    }

    /// Opens (or re-targets) the edit session for `item`, seeding the draft
    /// with its current content. Any previous unsaved draft is discarded.
    pub fn start_edit(&self, item: &Item) {
        self.inner()
            .edit
            .start(item.id.clone(), item.content.clone());
        self.notify();
    }

    /// Replaces the draft text. Ignored while no session is open.
    pub fn set_draft(&self, draft: String) {
        if self.inner().edit.set_draft(draft) {
            self.notify();
        }
    }

    pub fn cancel_edit(&self) {
        let mut inner = self.inner();
        if inner.edit.is_editing() {
            inner.edit.reset();
            drop(inner);
            self.notify();
        }
    }

    /// Writes the open draft to the ledger. The session closes once the
    /// write is confirmed; on failure it stays open with the draft intact.
    /// A commit with no open session is a no-op.
    pub async fn commit_edit(&self) -> ResultController<()> {
        let Some((id, draft)) = self.inner().edit.snapshot() else {
            return Ok(());
        };
        self.begin_attempt();
        let result = self.run_commit(&id, &draft).await;
        self.finish_attempt(result)
    }

    /// Claims a pending wallet switch or disconnect, if any.
    ///
    /// Presentation layers call this on their tick. The change is only taken
    /// while holding the gate: an idle tick rebinds and reloads the list
    /// right here, while a change landing mid-operation stays queued until
    /// that operation's reload, or a later tick, picks it up.
    pub async fn sync_identity(&self) -> ResultController<()> {
        if !self.pending_account_change() {
            return Ok(());
        }
        let Some(_permit) = self.gate.try_acquire() else {
            return Ok(());
        };
        self.begin_attempt();
        let result = self.reconcile().await;
        self.finish_attempt(result)
    }

    async fn run_connect(&self) -> ResultController<()> {
        let _permit = self.acquire()?;
        self.notify();
        let account = self
            .provider
            .request_account()
            .await
            .map_err(|err| ControllerError::IdentityUnavailable(err.to_string()))?;
        tracing::debug!("binding account {account}");
        {
            let mut inner = self.inner();
            self.bind(&mut inner, Some(account));
        }
        self.notify();
        self.reconcile().await
    }

    async fn run_refresh(&self) -> ResultController<()> {
        let _permit = self.acquire()?;
        self.notify();
        self.reconcile().await
    }

    async fn run_create(&self, content: &str) -> ResultController<()> {
        let _permit = self.acquire()?;
        self.notify();
        let client = self.bound_client()?;
        client.create(content).await?;
        self.reconcile().await
    }

    async fn run_toggle(&self, id: &ItemId) -> ResultController<()> {
        let _permit = self.acquire()?;
        self.notify();
        let client = self.bound_client()?;
        client.toggle_completion(id).await?;
        self.reconcile().await
    }

    async fn run_delete(&self, id: &ItemId) -> ResultController<()> {
        let _permit = self.acquire()?;
        self.notify();
        let client = self.bound_client()?;
        client.delete(id).await?;
        self.reconcile().await
    }

    async fn run_commit(&self, id: &ItemId, draft: &str) -> ResultController<()> {
        let _permit = self.acquire()?;
        self.notify();
        let client = self.bound_client()?;
        client.update(id, draft).await?;
        {
            let mut inner = self.inner();
            // A rebind may already have reset the session; only close it if
            // it still targets the committed item.
            if inner.edit.item_id() == Some(id) {
                inner.edit.reset();
            }
        }
        self.reconcile().await
    }

    /// Replaces the cache with a fresh read of the bound account's list.
    ///
    /// Any queued wallet switch is claimed before reading. The read is
    /// tagged with the bind epoch it started under; if a switch lands while
    /// the read is in flight, the result is thrown away and the loop reads
    /// again for the new account, so what gets installed always belongs to
    /// the account it is displayed under.
    async fn reconcile(&self) -> ResultController<()> {
        loop {
            if self.absorb_account_change() {
                self.notify();
            }
            let (client, epoch) = {
                let inner = self.inner();
                let client = inner.client.clone().ok_or_else(no_account)?;
                (client, inner.epoch)
            };
            let items = client.list().await?;
            if self.absorb_account_change() {
                self.notify();
                continue;
            }
            {
                let mut inner = self.inner();
                if inner.epoch != epoch {
                    continue;
                }
                inner.items = items;
                let vanished = inner
                    .edit
                    .item_id()
                    .is_some_and(|id| !inner.items.iter().any(|item| item.id == *id));
                if vanished {
                    inner.edit.reset();
                }
            }
            self.notify();
            return Ok(());
        }
    }

    /// Drains the wallet change feed; returns whether a different account
    /// was bound (or the wallet went away). Rebinding clears the cache and
    /// the edit session and invalidates in-flight reads.
    fn absorb_account_change(&self) -> bool {
        let latest = {
            let mut rx = match self.account_rx.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !rx.has_changed().unwrap_or(false) {
                return false;
            }
            rx.borrow_and_update().clone()
        };
        let mut inner = self.inner();
        let current = inner.client.as_ref().map(|client| client.account().clone());
        if latest == current {
            return false;
        }
        match &latest {
            Some(account) => tracing::debug!("wallet switched to {account}"),
            None => tracing::debug!("wallet disconnected"),
        }
        self.bind(&mut inner, latest);
        true
    }

    /// Whether the wallet feed holds a change no reload has claimed yet.
    fn pending_account_change(&self) -> bool {
        let rx = match self.account_rx.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rx.has_changed().unwrap_or(false)
    }

    fn bind(&self, inner: &mut Inner<L>, account: Option<AccountId>) {
        inner.client =
            account.map(|account| LedgerClient::new(Arc::clone(&self.ledger), account));
        inner.epoch += 1;
        inner.items.clear();
        inner.edit.reset();
    }

    fn bound_client(&self) -> ResultController<LedgerClient<L>> {
        self.inner().client.clone().ok_or_else(no_account)
    }

    fn acquire(&self) -> ResultController<GatePermit<'_>> {
        self.gate.try_acquire().ok_or(ControllerError::Busy)
    }

    fn begin_attempt(&self) {
        self.inner().last_error = None;
        self.notify();
    }

    fn finish_attempt(&self, result: ResultController<()>) -> ResultController<()> {
        if let Err(err) = &result {
            tracing::warn!("operation failed: {err}");
            self.inner().last_error = Some(err.to_string());
        }
        self.notify();
        result
    }

    fn inner(&self) -> MutexGuard<'_, Inner<L>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

fn no_account() -> ControllerError {
    ControllerError::IdentityUnavailable("no wallet account is bound".to_string())
}
