//! Per-file cloud transfer state machine
//!
//! Every remote save file moves through
//! `Idle -> Opening -> Opened -> (Reading | Writing) -> Committed | Failed`.
//! The backend requires each file to be opened before its content can be
//! read or written, so the machine enforces that ordering; `Failed` is
//! reachable from any non-terminal state (capability violations fail a file
//! before it ever opens).

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Conflict resolution policy passed to the backend's open call.
///
/// The save layer always uses [`ConflictPolicy::LongestPlaytime`]: when the
/// local and remote replicas of a file diverge, the variant with the longest
/// recorded play time wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the replica with the longest recorded play time
    LongestPlaytime,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::LongestPlaytime => write!(f, "longest_playtime"),
        }
    }
}

/// State of one per-file cloud operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// No operation started
    Idle,
    /// Open request in flight
    Opening,
    /// File opened; content may be read or written
    Opened,
    /// Read request in flight
    Reading,
    /// Write/commit request in flight
    Writing,
    /// Operation finished successfully
    Committed,
    /// Operation failed; the reason is recorded
    Failed(String),
}

impl TransferState {
    /// Returns true for `Committed` and `Failed`
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Committed | TransferState::Failed(_))
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferState::Idle => write!(f, "idle"),
            TransferState::Opening => write!(f, "opening"),
            TransferState::Opened => write!(f, "opened"),
            TransferState::Reading => write!(f, "reading"),
            TransferState::Writing => write!(f, "writing"),
            TransferState::Committed => write!(f, "committed"),
            TransferState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Tracks one remote file through the open/read-or-write/commit protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTransfer {
    file_name: String,
    state: TransferState,
}

impl CloudTransfer {
    /// Creates an idle transfer for `file_name`
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            state: TransferState::Idle,
        }
    }

    /// Returns the remote file name
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the current state
    #[must_use]
    pub fn state(&self) -> &TransferState {
        &self.state
    }

    /// Idle -> Opening
    pub fn start_open(&mut self) -> Result<(), DomainError> {
        self.transition(TransferState::Idle, TransferState::Opening)
    }

    /// Opening -> Opened
    pub fn opened(&mut self) -> Result<(), DomainError> {
        self.transition(TransferState::Opening, TransferState::Opened)
    }

    /// Opened -> Reading
    pub fn start_read(&mut self) -> Result<(), DomainError> {
        self.transition(TransferState::Opened, TransferState::Reading)
    }

    /// Opened -> Writing
    pub fn start_write(&mut self) -> Result<(), DomainError> {
        self.transition(TransferState::Opened, TransferState::Writing)
    }

    /// Reading | Writing -> Committed
    pub fn committed(&mut self) -> Result<(), DomainError> {
        match self.state {
            TransferState::Reading | TransferState::Writing => {
                self.state = TransferState::Committed;
                Ok(())
            }
            _ => Err(self.invalid(TransferState::Committed)),
        }
    }

    /// Any non-terminal state -> Failed
    pub fn failed(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        if self.state.is_terminal() {
            return Err(self.invalid(TransferState::Failed(String::new())));
        }
        self.state = TransferState::Failed(reason.into());
        Ok(())
    }

    fn transition(&mut self, expected: TransferState, next: TransferState) -> Result<(), DomainError> {
        if self.state != expected {
            return Err(self.invalid(next));
        }
        self.state = next;
        Ok(())
    }

    fn invalid(&self, to: TransferState) -> DomainError {
        DomainError::InvalidTransition {
            from: self.state.to_string(),
            to: to.to_string(),
        }
    }
}
