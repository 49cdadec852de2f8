//! File-backed implementation of the local store port
//!
//! The save file is one JSON document mapping save keys to blobs. Every
//! persist rewrites it wholesale through a temporary file in the same
//! directory followed by an atomic rename, so readers never observe a
//! partial document. A missing file loads as an empty mapping.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, info};

use savepoint_core::config::LocalStoreConfig;
use savepoint_core::domain::{BlobStore, SaveBlob, SaveKey};
use savepoint_core::ports::LocalStore;

/// Local save file adapter
///
/// `encode` wraps the JSON document in a base64 layer on disk; it changes
/// the file's shape, not the persistence contract. Content is always UTF-8
/// and password-based obfuscation is out of scope (`encode_password` in the
/// configuration is accepted but unused).
pub struct FileStore {
    path: PathBuf,
    encode: bool,
}

impl FileStore {
    /// Creates a store writing to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encode: false,
        }
    }

    /// Creates a store from the local section of the configuration
    #[must_use]
    pub fn from_config(config: &LocalStoreConfig) -> Self {
        Self {
            path: config
                .directory
                .join(format!("{}.json", config.save_id)),
            encode: config.encode,
        }
    }

    /// Enables the on-disk base64 encode layer
    #[must_use]
    pub fn with_encode(mut self, encode: bool) -> Self {
        self.encode = encode;
        self
    }

    /// Returns the save file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalStore for FileStore {
    fn load(&self) -> Result<HashMap<SaveKey, SaveBlob>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No save file found, starting empty");
            return Ok(HashMap::new());
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read save file {}", self.path.display()))?;

        let json = if self.encode {
            let bytes = BASE64
                .decode(raw.trim())
                .context("Failed to decode save file content")?;
            String::from_utf8(bytes).context("Decoded save file is not valid UTF-8")?
        } else {
            raw
        };

        let saves: HashMap<SaveKey, SaveBlob> =
            serde_json::from_str(&json).context("Failed to parse save file")?;

        debug!(path = %self.path.display(), entries = saves.len(), "Loaded save file");
        Ok(saves)
    }

    fn persist(&self, store: &BlobStore) -> Result<()> {
        let json = serde_json::to_string(store).context("Failed to serialize save mapping")?;
        let content = if self.encode {
            BASE64.encode(json.as_bytes())
        } else {
            json
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create save directory {}", dir.display()))?;

        // Temp file in the target directory so the rename stays on one
        // filesystem and replaces the old document atomically.
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .context("Failed to create temporary save file")?;
        temp.write_all(content.as_bytes())
            .context("Failed to write temporary save file")?;
        temp.flush().context("Failed to flush temporary save file")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to replace save file {}", self.path.display()))?;

        debug!(path = %self.path.display(), entries = store.len(), "Persisted save file");
        Ok(())
    }
}
