//! Save layer error types

use thiserror::Error;

use savepoint_core::domain::{CapabilityFlags, DomainError, SaveKey};
use savepoint_core::serialize::SerializeError;

/// Errors surfaced by the save facade and reconciliation engine
#[derive(Debug, Error)]
pub enum SyncError {
    /// `load` was called for a key that was never saved
    #[error("No save with key {0:?} found when loading")]
    NotFound(SaveKey),

    /// One or more cloud preconditions failed; the value combines every
    /// failed flag
    #[error("Cloud save preconditions failed: {0}")]
    Capability(CapabilityFlags),

    /// A remote open/read/commit/fetch operation returned a non-success
    /// status
    #[error("Cloud {op} operation failed")]
    Remote {
        /// Which protocol operation failed
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Platform login failed
    #[error("Cloud authentication failed")]
    Auth(#[source] anyhow::Error),

    /// Model (de)serialization failed
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    /// The local save file could not be loaded or rewritten
    #[error("Local save file error")]
    Store(#[source] anyhow::Error),

    /// A per-file transfer was driven through an invalid state transition
    #[error(transparent)]
    Transfer(#[from] DomainError),
}
