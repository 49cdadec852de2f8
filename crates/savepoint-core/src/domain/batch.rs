//! LoadBatch - join barrier over one reconciliation batch
//!
//! The cloud backend's fetch-all call returns metadata for N files, but each
//! file's content must be opened and read independently and asynchronously.
//! `LoadBatch` is the join barrier over those N completions: every file must
//! report exactly once (success or failure), results may arrive in any
//! interleaved order across files, and the completion callback fires exactly
//! once, the instant the last file is accounted for.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::newtypes::{BatchId, SaveKey};
use super::store::SaveBlob;

/// Callback invoked once with every payload-bearing load, in arrival order
pub type OnBatchComplete = Box<dyn FnOnce(Vec<(SaveKey, SaveBlob)>) + Send>;

/// Tracks which remote files of one batch are still outstanding
///
/// The pending set strictly shrinks. Calling [`LoadBatch::mark_loaded`]
/// twice for the same file is a caller error: double-removal is a no-op, so
/// completion still fires at most once, but the accounting can undercount.
/// After completion the batch is inert and further calls are no-ops.
pub struct LoadBatch {
    id: BatchId,
    pending: HashSet<String>,
    loaded: Vec<(SaveKey, SaveBlob)>,
    on_complete: Option<OnBatchComplete>,
    complete: bool,
}

impl LoadBatch {
    /// Seeds the pending set from the batch's file names.
    ///
    /// An empty file list completes immediately: the callback runs from this
    /// constructor with an empty payload list.
    pub fn new<I, S>(file_names: I, on_complete: OnBatchComplete) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pending: HashSet<String> = file_names.into_iter().map(Into::into).collect();
        let mut batch = Self {
            id: BatchId::new(),
            pending,
            loaded: Vec::new(),
            on_complete: Some(on_complete),
            complete: false,
        };

        debug!(batch_id = %batch.id, files = batch.pending.len(), "Load batch created");
        batch.fire_if_done();
        batch
    }

    /// Returns the batch identifier
    #[must_use]
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Returns true once the completion callback has fired
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns the number of files not yet accounted for
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Accounts for `file_name` without a payload (failed or empty load)
    pub fn mark_loaded(&mut self, file_name: &str) {
        self.remove(file_name);
        self.fire_if_done();
    }

    /// Accounts for `file_name` and records its decoded payload
    pub fn mark_loaded_with(&mut self, file_name: &str, key: SaveKey, blob: SaveBlob) {
        if self.remove(file_name) {
            self.loaded.push((key, blob));
        }
        self.fire_if_done();
    }

    fn remove(&mut self, file_name: &str) -> bool {
        if self.complete {
            warn!(batch_id = %self.id, file = file_name, "Load reported after batch completion; ignoring");
            return false;
        }
        let removed = self.pending.remove(file_name);
        if !removed {
            warn!(batch_id = %self.id, file = file_name, "Load reported for unknown or already-reported file");
        }
        removed
    }

    fn fire_if_done(&mut self) {
        if self.complete || !self.pending.is_empty() {
            return;
        }
        self.complete = true;
        if let Some(on_complete) = self.on_complete.take() {
            debug!(batch_id = %self.id, payloads = self.loaded.len(), "Load batch complete");
            on_complete(std::mem::take(&mut self.loaded));
        }
    }
}

impl std::fmt::Debug for LoadBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBatch")
            .field("id", &self.id)
            .field("pending", &self.pending)
            .field("loaded", &self.loaded.len())
            .field("complete", &self.complete)
            .finish()
    }
}
