//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! validation failures and invalid protocol state transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Save key is empty or whitespace-only
    #[error("Invalid save key: {0:?}")]
    InvalidSaveKey(String),

    /// Invalid transfer state transition attempt
    #[error("Invalid transfer transition from {from} to {to}")]
    InvalidTransition {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Batch ID parsing error
    #[error("Invalid batch ID: {0}")]
    InvalidBatchId(String),
}
