use std::sync::Mutex;

use api_types::AccountId;
use controller::{IdentityError, IdentityProvider};
use tokio::sync::watch;

/// Identity provider backed by the account list in the config file.
///
/// Stands in for an external wallet: one active account at a time, switches
/// published on a watch channel. `cycle` is bound to a key and plays the
/// role of the user switching accounts in their wallet.
pub struct WalletProvider {
    accounts: Vec<AccountId>,
    active: Mutex<usize>,
    changes: watch::Sender<Option<AccountId>>,
}

impl WalletProvider {
    pub fn new(accounts: Vec<AccountId>) -> Self {
        let changes = watch::Sender::new(accounts.first().cloned());
        Self {
            accounts,
            active: Mutex::new(0),
            changes,
        }
    }

    /// Activates the next configured account, when there is more than one.
    pub fn cycle(&self) {
        if self.accounts.len() < 2 {
            return;
        }
        let mut active = match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *active = (*active + 1) % self.accounts.len();
        let account = self.accounts[*active].clone();
        tracing::info!("wallet switched to {account}");
        self.changes.send_replace(Some(account));
    }
}

impl IdentityProvider for WalletProvider {
    async fn request_account(&self) -> Result<AccountId, IdentityError> {
        let active = match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.accounts
            .get(*active)
            .cloned()
            .ok_or_else(|| IdentityError::new("no wallet accounts configured"))
    }

    fn subscribe(&self) -> watch::Receiver<Option<AccountId>> {
        self.changes.subscribe()
    }
}
