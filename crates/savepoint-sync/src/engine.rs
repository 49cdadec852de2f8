//! Cloud reconciliation engine
//!
//! Drives the per-file protocol against the cloud backend:
//!
//! 1. **Write path** (`write_file`): capability check, open with the
//!    longest-playtime policy, encode the payload to its binary frame,
//!    commit with a timestamped description. Any failure is terminal for
//!    that file.
//! 2. **Read path** (`reconcile_all`): fetch-all, then open and read every
//!    file concurrently. A [`LoadBatch`] is the join barrier; every file
//!    reports exactly once, with or without a payload, so the batch always
//!    completes. Remote payloads then overwrite differing local entries and
//!    the store is persisted.
//!
//! Per-file read failures are recovered here (logged, payload-less report);
//! write failures surface to the caller. No retries anywhere.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use savepoint_core::domain::{
    BlobStore, CapabilityFlags, CloudTransfer, ConflictPolicy, LoadBatch, SaveBlob, SaveKey,
};
use savepoint_core::ports::{CloudSaveBackend, LocalStore, RemoteSaveMeta};
use savepoint_core::wire;

use crate::error::SyncError;

/// Engine for the open/read-or-write/commit cloud protocol
#[derive(Clone)]
pub struct ReconcileEngine {
    backend: Arc<dyn CloudSaveBackend>,
    local: Arc<dyn LocalStore>,
    blobs: Arc<Mutex<BlobStore>>,
}

impl ReconcileEngine {
    /// Creates an engine over the shared blob store and the two ports
    pub fn new(
        backend: Arc<dyn CloudSaveBackend>,
        local: Arc<dyn LocalStore>,
        blobs: Arc<Mutex<BlobStore>>,
    ) -> Self {
        Self {
            backend,
            local,
            blobs,
        }
    }

    /// Evaluates the cloud preconditions for one file name.
    ///
    /// Every failed precondition is combined into the returned flags; an
    /// empty value means the operation may proceed.
    pub fn evaluate_capabilities(&self, name: &str) -> CapabilityFlags {
        let mut flags = CapabilityFlags::NONE;
        if !self.backend.is_authenticated() {
            flags |= CapabilityFlags::NOT_AUTHENTICATED;
        }
        if !self.backend.cloud_save_enabled() {
            flags |= CapabilityFlags::CLOUD_SAVE_DISABLED;
        }
        if name.trim().is_empty() {
            flags |= CapabilityFlags::NAME_NOT_SET;
        }
        flags
    }

    /// Writes one payload to the cloud: open, encode, commit.
    ///
    /// A capability violation or a rejected open/commit is fatal for this
    /// file's operation and surfaces as an error; the local store is never
    /// touched here.
    pub async fn write_file(&self, name: &str, blob: &SaveBlob) -> Result<(), SyncError> {
        let mut transfer = CloudTransfer::new(name);

        let flags = self.evaluate_capabilities(name);
        if !flags.is_empty() {
            transfer.failed(flags.to_string())?;
            warn!(file = name, flags = %flags, "Cloud write blocked by capability check");
            return Err(SyncError::Capability(flags));
        }

        transfer.start_open()?;
        let meta = match self.backend.open(name, ConflictPolicy::LongestPlaytime).await {
            Ok(meta) => {
                transfer.opened()?;
                meta
            }
            Err(source) => {
                transfer.failed(source.to_string())?;
                return Err(SyncError::Remote { op: "open", source });
            }
        };

        transfer.start_write()?;
        let description = format!("Last save: {}", Utc::now().to_rfc3339());
        let frame = wire::encode(blob);
        match self.backend.commit(&meta, &description, &frame).await {
            Ok(()) => {
                transfer.committed()?;
                info!(file = name, bytes = frame.len(), "Saved to cloud");
                Ok(())
            }
            Err(source) => {
                transfer.failed(source.to_string())?;
                Err(SyncError::Remote { op: "commit", source })
            }
        }
    }

    /// Fetches every remote file, loads them concurrently, and merges the
    /// payloads into the blob store (remote wins on mismatch).
    ///
    /// Returns the number of local entries that changed. Individual file
    /// failures drain the join barrier without contributing a payload; only
    /// the fetch-all call and the final persist can fail the batch.
    pub async fn reconcile_all(&self) -> Result<usize, SyncError> {
        let metas = self
            .backend
            .fetch_all()
            .await
            .map_err(|source| SyncError::Remote {
                op: "fetch_all",
                source,
            })?;

        let names: Vec<String> = metas.iter().map(|m| m.file_name.clone()).collect();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let batch = Arc::new(Mutex::new(LoadBatch::new(
            names,
            Box::new(move |payloads| {
                let _ = tx.send(payloads);
            }),
        )));

        info!(files = metas.len(), batch_id = %batch.lock().expect("batch lock poisoned").id(), "Reconciling cloud saves");

        for meta in metas {
            let engine = self.clone();
            let batch = Arc::clone(&batch);
            tokio::spawn(async move {
                engine.load_one(meta, &batch).await;
            });
        }

        let payloads = match rx.await {
            Ok(payloads) => payloads,
            Err(_) => {
                warn!("Reconciliation batch dropped before completion");
                return Ok(0);
            }
        };

        let changed = {
            let mut blobs = self.blobs.lock().expect("blob store lock poisoned");
            let changed = blobs.merge_remote(payloads);
            self.local.persist(&blobs).map_err(SyncError::Store)?;
            changed
        };

        info!(changed, "Cloud reconciliation complete");
        Ok(changed)
    }

    /// Loads one remote file and reports it to the batch, payload-less on
    /// any failure so the barrier always advances.
    async fn load_one(&self, meta: RemoteSaveMeta, batch: &Mutex<LoadBatch>) {
        let name = meta.file_name.clone();
        match self.read_file(&meta).await {
            Ok(blob) => match SaveKey::new(name.clone()) {
                Ok(key) => {
                    debug!(file = %name, "Loaded from cloud");
                    batch
                        .lock()
                        .expect("batch lock poisoned")
                        .mark_loaded_with(&name, key, blob);
                }
                Err(err) => {
                    warn!(file = %name, error = %err, "Remote file name is not a valid save key");
                    batch.lock().expect("batch lock poisoned").mark_loaded(&name);
                }
            },
            Err(err) => {
                warn!(file = %name, error = %err, "Failed to load cloud save");
                batch.lock().expect("batch lock poisoned").mark_loaded(&name);
            }
        }
    }

    /// Reads one remote file through the open/read protocol and decodes its
    /// binary frame back to the textual payload.
    async fn read_file(&self, meta: &RemoteSaveMeta) -> Result<SaveBlob, SyncError> {
        let name = &meta.file_name;
        let mut transfer = CloudTransfer::new(name.clone());

        let flags = self.evaluate_capabilities(name);
        if !flags.is_empty() {
            transfer.failed(flags.to_string())?;
            return Err(SyncError::Capability(flags));
        }

        transfer.start_open()?;
        let opened = match self.backend.open(name, ConflictPolicy::LongestPlaytime).await {
            Ok(opened) => {
                transfer.opened()?;
                opened
            }
            Err(source) => {
                transfer.failed(source.to_string())?;
                return Err(SyncError::Remote { op: "open", source });
            }
        };

        transfer.start_read()?;
        let bytes = match self.backend.read_binary(&opened).await {
            Ok(bytes) => {
                transfer.committed()?;
                bytes
            }
            Err(source) => {
                transfer.failed(source.to_string())?;
                return Err(SyncError::Remote { op: "read", source });
            }
        };

        wire::decode(&bytes).map_err(|err| SyncError::Remote {
            op: "read",
            source: anyhow::Error::new(err).context("Failed to decode cloud save frame"),
        })
    }
}
