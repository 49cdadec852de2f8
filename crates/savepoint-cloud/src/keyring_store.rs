//! OS credential-store adapter
//!
//! For platforms whose cloud saves ride on the system keychain instead of a
//! dedicated save service. Each save file is one credential entry holding
//! the base64 of its binary frame; a separate index entry enumerates the
//! file names, since credential stores cannot be listed.
//!
//! Replica conflicts cannot occur here (the keychain is the only copy), so
//! the conflict policy is accepted and ignored. Commit descriptions are
//! logged but not stored; the keychain has no description field.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, info};

use savepoint_core::domain::ConflictPolicy;
use savepoint_core::ports::{CloudSaveBackend, RemoteSaveMeta};

/// Username of the index entry inside the service namespace
const INDEX_ENTRY: &str = "__index__";

/// Cloud save backend over the OS credential store
pub struct KeyringSaveBackend {
    service: String,
    authenticated: AtomicBool,
}

impl KeyringSaveBackend {
    /// Creates a backend storing entries under `service`
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            authenticated: AtomicBool::new(false),
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, name).context("Failed to create keyring entry")
    }

    /// Loads the index of known save names; an absent index is empty
    fn load_index(&self) -> Result<Vec<String>> {
        let entry = self.entry(INDEX_ENTRY)?;
        match entry.get_password() {
            Ok(json) => {
                serde_json::from_str(&json).context("Failed to parse keyring save index")
            }
            Err(keyring::Error::NoEntry) => Ok(Vec::new()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to read keyring save index")),
        }
    }

    fn store_index(&self, names: &[String]) -> Result<()> {
        let entry = self.entry(INDEX_ENTRY)?;
        let json = serde_json::to_string(names).context("Failed to serialize keyring save index")?;
        entry
            .set_password(&json)
            .context("Failed to store keyring save index")?;
        Ok(())
    }

    fn meta_for(name: &str) -> RemoteSaveMeta {
        RemoteSaveMeta {
            file_name: name.to_string(),
            description: String::new(),
            modified: None,
            played_secs: 0,
        }
    }
}

#[async_trait::async_trait]
impl CloudSaveBackend for KeyringSaveBackend {
    async fn authenticate(&self) -> Result<()> {
        // There is no remote session; authentication succeeds when the
        // credential store is reachable at all.
        self.load_index()
            .context("Credential store is not accessible")?;
        self.authenticated.store(true, Ordering::SeqCst);
        info!(service = %self.service, "Credential store session established");
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn cloud_save_enabled(&self) -> bool {
        true
    }

    async fn fetch_all(&self) -> Result<Vec<RemoteSaveMeta>> {
        let names = self.load_index()?;
        debug!(files = names.len(), "Listed credential-store saves");
        Ok(names.iter().map(|n| Self::meta_for(n)).collect())
    }

    async fn open(&self, name: &str, _policy: ConflictPolicy) -> Result<RemoteSaveMeta> {
        let mut names = self.load_index()?;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            self.store_index(&names)?;
            debug!(file = name, "Registered new credential-store save");
        }
        Ok(Self::meta_for(name))
    }

    async fn read_binary(&self, meta: &RemoteSaveMeta) -> Result<Vec<u8>> {
        let entry = self.entry(&meta.file_name)?;
        let encoded = entry
            .get_password()
            .with_context(|| format!("Failed to read credential-store save {:?}", meta.file_name))?;
        BASE64
            .decode(encoded)
            .context("Credential-store save content is not valid base64")
    }

    async fn commit(&self, meta: &RemoteSaveMeta, description: &str, data: &[u8]) -> Result<()> {
        let entry = self.entry(&meta.file_name)?;
        entry
            .set_password(&BASE64.encode(data))
            .with_context(|| format!("Failed to store credential-store save {:?}", meta.file_name))?;
        debug!(file = %meta.file_name, description, bytes = data.len(), "Committed credential-store save");
        Ok(())
    }
}
