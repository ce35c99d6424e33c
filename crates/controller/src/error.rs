//! The module contains the errors the controller surfaces to callers.
//!
//! Every variant carries a ready-to-display message. The controller keeps the
//! most recent one in its error channel until the next attempt starts, so the
//! presentation layer can always show what went wrong last.
use thiserror::Error;

/// Controller custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// No wallet account is bound, or the wallet refused access.
    #[error("identity unavailable: {0}")]
    IdentityUnavailable(String),
    /// A local precondition failed; nothing reached the ledger.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Reading the item list failed; the cache keeps its last good value.
    #[error("read failed: {0}")]
    Read(String),
    /// Submitting or confirming a write failed.
    #[error("submit failed: {0}")]
    Submit(String),
    /// Another gated operation is already in flight.
    #[error("another operation is in progress")]
    Busy,
}
