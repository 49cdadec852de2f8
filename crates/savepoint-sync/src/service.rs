//! SaveService - the public save/load facade
//!
//! Combines the blob store, the serializer and the cloud engine into the
//! API game code calls: save a model, load it back into a live instance,
//! mirror cloud-backed models, and reconcile local state with the cloud at
//! startup.

use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use savepoint_core::domain::{BlobStore, SaveBlob, SaveKey};
use savepoint_core::ports::{CloudSaveBackend, LocalStore};
use savepoint_core::serialize::{Saveable, Serializer};

use crate::engine::ReconcileEngine;
use crate::error::SyncError;

/// Local and cloud saving and loading for any [`Saveable`] model
///
/// Saving is two sequential, independent steps: the local commit always
/// happens first and is never rolled back by a remote failure. Loading only
/// reads the local store; cloud state enters it through
/// [`SaveService::load_resources`] reconciliation.
pub struct SaveService {
    blobs: Arc<Mutex<BlobStore>>,
    local: Arc<dyn LocalStore>,
    cloud: Arc<dyn CloudSaveBackend>,
    serializer: Serializer,
    engine: ReconcileEngine,
}

impl SaveService {
    /// Constructs the service and loads the local save file.
    ///
    /// A missing file yields an empty store; a corrupt one is an error.
    pub fn new(
        local: Arc<dyn LocalStore>,
        cloud: Arc<dyn CloudSaveBackend>,
        serializer: Serializer,
    ) -> Result<Self, SyncError> {
        let loaded = local.load().map_err(SyncError::Store)?;
        info!(entries = loaded.len(), "Save service started");

        let blobs = Arc::new(Mutex::new(BlobStore::from_map(loaded)));
        let engine = ReconcileEngine::new(Arc::clone(&cloud), Arc::clone(&local), Arc::clone(&blobs));

        Ok(Self {
            blobs,
            local,
            cloud,
            serializer,
            engine,
        })
    }

    /// Registers excluded field names for model type `T`
    pub fn exclude_fields<T: 'static>(&mut self, fields: &[&str]) {
        self.serializer.exclude::<T>(fields);
    }

    /// Saves a model locally and, when it opts in and a session is held,
    /// mirrors it to the cloud.
    ///
    /// The local write commits before any cloud traffic; a cloud failure
    /// surfaces as an error but the local save has already happened. An
    /// unauthenticated session skips the cloud step silently.
    pub async fn save<T: Saveable>(&self, model: &T) -> Result<(), SyncError> {
        let key = model.save_key();
        let blob = self.serializer.serialize(model)?;

        {
            let mut blobs = self.blobs.lock().expect("blob store lock poisoned");
            blobs.set(key.clone(), blob.clone());
            self.local.persist(&blobs).map_err(SyncError::Store)?;
        }
        debug!(key = %key, bytes = blob.len(), "Saved locally");

        if model.cloud_backed() && self.cloud.is_authenticated() {
            self.cloud_save(key.as_str(), &blob).await?;
        }
        Ok(())
    }

    /// Loads a model, failing when no save exists for its key
    pub fn load<T: Saveable>(&self, model: &mut T) -> Result<(), SyncError> {
        let key = model.save_key();
        let blob = {
            let blobs = self.blobs.lock().expect("blob store lock poisoned");
            blobs.get(&key).cloned()
        };

        match blob {
            Some(blob) => {
                self.serializer.deserialize(&blob, model)?;
                debug!(key = %key, "Loaded save");
                Ok(())
            }
            None => Err(SyncError::NotFound(key)),
        }
    }

    /// Loads a model when a save exists; returns whether one was found.
    ///
    /// The model is left untouched in the not-found case. A save that
    /// exists but cannot be deserialized is still an error.
    pub fn try_load<T: Saveable>(&self, model: &mut T) -> Result<bool, SyncError> {
        match self.load(model) {
            Ok(()) => Ok(true),
            Err(SyncError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Writes one already-serialized payload to the cloud.
    ///
    /// Capability and remote failures are hard errors on this direct path.
    pub async fn cloud_save(&self, name: &str, blob: &SaveBlob) -> Result<(), SyncError> {
        self.engine.write_file(name, blob).await
    }

    /// Authenticates with the platform and kicks off cloud reconciliation.
    ///
    /// Returns as soon as authentication succeeds; the fetch-all/open-all/
    /// merge pipeline runs as a background task and its outcome is logged,
    /// not returned. An authentication failure returns immediately and no
    /// reconciliation starts.
    pub async fn load_resources(&self) -> Result<(), SyncError> {
        self.cloud.authenticate().await.map_err(SyncError::Auth)?;
        info!("Logged in");

        let engine = self.engine.clone();
        tokio::spawn(async move {
            if let Err(err) = engine.reconcile_all().await {
                error!(error = %err, "Cloud reconciliation failed");
            }
        });
        Ok(())
    }

    /// Runs one reconciliation pass and waits for it.
    ///
    /// Same pipeline [`SaveService::load_resources`] spawns, exposed for
    /// callers that need to await the merge. Returns the number of local
    /// entries the cloud overwrote.
    pub async fn reconcile(&self) -> Result<usize, SyncError> {
        self.engine.reconcile_all().await
    }

    /// Returns a snapshot of the stored payload for `key`, if any
    #[must_use]
    pub fn blob(&self, key: &SaveKey) -> Option<SaveBlob> {
        self.blobs
            .lock()
            .expect("blob store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Returns the number of locally stored saves
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("blob store lock poisoned").len()
    }

    /// Returns true when no saves are stored locally
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.lock().expect("blob store lock poisoned").is_empty()
    }
}
