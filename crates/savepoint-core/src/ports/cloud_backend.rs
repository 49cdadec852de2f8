//! Cloud save backend port (driven/secondary port)
//!
//! Interface for the platform cloud-save service. One implementation talks
//! to an HTTP save service, another to the OS credential store; the trait is
//! backend-agnostic so the engine never branches on platform.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - `RemoteSaveMeta` is a port-level DTO, not a domain entity; the engine
//!   maps its file name to a [`SaveKey`](crate::domain::SaveKey) when
//!   payloads enter the domain.
//! - The backend requires every file to be opened before its content can be
//!   read or committed; the returned metadata is the handle for both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::transfer::ConflictPolicy;

/// Metadata describing one remote save file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSaveMeta {
    /// Remote file name (matches the local save key)
    pub file_name: String,
    /// Human-readable description, updated on every commit
    pub description: String,
    /// When the file was last committed
    pub modified: Option<DateTime<Utc>>,
    /// Total recorded play time in seconds; drives the longest-playtime
    /// conflict policy
    pub played_secs: u64,
}

/// Port trait for cloud save backend operations
///
/// ## Implementation Notes
///
/// - `authenticate` performs the platform login; the session is held by the
///   adapter and reflected by `is_authenticated`.
/// - No retry logic belongs here or in callers: a failed operation is
///   terminal for that attempt.
#[async_trait::async_trait]
pub trait CloudSaveBackend: Send + Sync {
    /// Authenticates the platform user session
    ///
    /// # Returns
    /// `Ok(())` once the session is established; any error means login
    /// failed and no cloud operation may proceed.
    async fn authenticate(&self) -> anyhow::Result<()>;

    /// Returns true while an authenticated session is held
    fn is_authenticated(&self) -> bool;

    /// Returns true when the backend has the cloud-save capability enabled
    fn cloud_save_enabled(&self) -> bool;

    /// Lists metadata for every remote save file
    async fn fetch_all(&self) -> anyhow::Result<Vec<RemoteSaveMeta>>;

    /// Opens a remote file, resolving replica conflicts with `policy`
    ///
    /// Opening is required before `read_binary` or `commit`. A file that
    /// does not exist yet is created empty by the open call.
    async fn open(&self, name: &str, policy: ConflictPolicy) -> anyhow::Result<RemoteSaveMeta>;

    /// Reads the binary content of an opened file
    async fn read_binary(&self, meta: &RemoteSaveMeta) -> anyhow::Result<Vec<u8>>;

    /// Commits new binary content and an updated description to an opened file
    async fn commit(
        &self,
        meta: &RemoteSaveMeta,
        description: &str,
        data: &[u8],
    ) -> anyhow::Result<()>;
}
