use std::future::Future;
use std::sync::Arc;

use api_types::AccountId;
use thiserror::Error;
use tokio::sync::watch;

/// Raised when the wallet cannot produce an account, either because none is
/// configured or because the user declined access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct IdentityError(String);

impl IdentityError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// External wallet surface: one account on demand plus change notifications.
///
/// `None` on the watch channel means the wallet disconnected. The receiver
/// side unsubscribes by being dropped.
pub trait IdentityProvider: Send + Sync {
    /// Asks the wallet for its active account, prompting the user if needed.
    fn request_account(&self)
    -> impl Future<Output = Result<AccountId, IdentityError>> + Send;

    /// Watches the active account as the wallet switches or disconnects.
    fn subscribe(&self) -> watch::Receiver<Option<AccountId>>;
}

impl<P: IdentityProvider> IdentityProvider for Arc<P> {
    fn request_account(
        &self,
    ) -> impl Future<Output = Result<AccountId, IdentityError>> + Send {
        P::request_account(self)
    }

    fn subscribe(&self) -> watch::Receiver<Option<AccountId>> {
        P::subscribe(self)
    }
}
