//! BlobStore domain entity
//!
//! The in-memory mapping from [`SaveKey`] to serialized payload. The store
//! holds at most one blob per key and is last-writer-wins on both local
//! saves and cloud reconciliation. Persistence is delegated to the
//! `LocalStore` port; callers flush the whole mapping after every mutation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::newtypes::SaveKey;

/// Serialized textual form of one model's persistable fields.
///
/// Immutable once written; the next save replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveBlob(String);

impl SaveBlob {
    /// Wraps an already-serialized payload
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// Returns the payload as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the blob and returns the inner string
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the payload length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for a zero-length payload
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SaveBlob {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}

impl AsRef<str> for SaveBlob {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// In-memory mapping from save key to serialized payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobStore {
    blobs: HashMap<SaveKey, SaveBlob>,
}

impl BlobStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstitutes a store from a loaded mapping
    #[must_use]
    pub fn from_map(blobs: HashMap<SaveKey, SaveBlob>) -> Self {
        Self { blobs }
    }

    /// Returns the blob for `key`, if present
    #[must_use]
    pub fn get(&self, key: &SaveKey) -> Option<&SaveBlob> {
        self.blobs.get(key)
    }

    /// Returns true when a blob exists for `key`
    #[must_use]
    pub fn contains(&self, key: &SaveKey) -> bool {
        self.blobs.contains_key(key)
    }

    /// Inserts or replaces the blob for `key` (last-writer-wins)
    pub fn set(&mut self, key: SaveKey, blob: SaveBlob) {
        self.blobs.insert(key, blob);
    }

    /// Merges remote payloads into the store; the remote value wins on any
    /// mismatch.
    ///
    /// Returns the number of entries that actually changed. Overwriting with
    /// an equal value is skipped, but the merge is idempotent either way.
    pub fn merge_remote<I>(&mut self, payloads: I) -> usize
    where
        I: IntoIterator<Item = (SaveKey, SaveBlob)>,
    {
        let mut changed = 0;
        for (key, blob) in payloads {
            if self.blobs.get(&key) != Some(&blob) {
                self.blobs.insert(key, blob);
                changed += 1;
            }
        }
        changed
    }

    /// Iterates over all (key, blob) entries
    pub fn iter(&self) -> impl Iterator<Item = (&SaveKey, &SaveBlob)> {
        self.blobs.iter()
    }

    /// Returns the number of stored blobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns true when the store holds no blobs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Returns a clone of the underlying mapping (for persistence)
    #[must_use]
    pub fn to_map(&self) -> HashMap<SaveKey, SaveBlob> {
        self.blobs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SaveKey {
        SaveKey::new(s).unwrap()
    }

    #[test]
    fn test_empty_store() {
        let store = BlobStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.get(&key("missing")).is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut store = BlobStore::new();
        store.set(key("a"), SaveBlob::new("{\"hp\":10}"));

        assert!(store.contains(&key("a")));
        assert_eq!(store.get(&key("a")).unwrap().as_str(), "{\"hp\":10}");
    }

    #[test]
    fn test_last_writer_wins() {
        let mut store = BlobStore::new();
        store.set(key("a"), SaveBlob::new("v1"));
        store.set(key("a"), SaveBlob::new("v2"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key("a")).unwrap().as_str(), "v2");
    }

    #[test]
    fn test_merge_remote_overwrites_on_mismatch() {
        let mut store = BlobStore::new();
        store.set(key("x"), SaveBlob::new("v1"));

        let changed = store.merge_remote(vec![(key("x"), SaveBlob::new("v2"))]);

        assert_eq!(changed, 1);
        assert_eq!(store.get(&key("x")).unwrap().as_str(), "v2");
    }

    #[test]
    fn test_merge_remote_equal_value_is_noop() {
        let mut store = BlobStore::new();
        store.set(key("x"), SaveBlob::new("v1"));

        let changed = store.merge_remote(vec![(key("x"), SaveBlob::new("v1"))]);

        assert_eq!(changed, 0);
        assert_eq!(store.get(&key("x")).unwrap().as_str(), "v1");
    }

    #[test]
    fn test_merge_remote_inserts_new_keys() {
        let mut store = BlobStore::new();

        let changed = store.merge_remote(vec![
            (key("a"), SaveBlob::new("va")),
            (key("b"), SaveBlob::new("vb")),
        ]);

        assert_eq!(changed, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut store = BlobStore::new();
        let payloads = vec![(key("a"), SaveBlob::new("va"))];

        store.merge_remote(payloads.clone());
        let second = store.merge_remote(payloads);

        assert_eq!(second, 0);
        assert_eq!(store.get(&key("a")).unwrap().as_str(), "va");
    }

    #[test]
    fn test_map_roundtrip() {
        let mut store = BlobStore::new();
        store.set(key("a"), SaveBlob::new("va"));
        store.set(key("b"), SaveBlob::new("vb"));

        let reloaded = BlobStore::from_map(store.to_map());
        assert_eq!(reloaded, store);
    }

    #[test]
    fn test_serialization_is_plain_map() {
        let mut store = BlobStore::new();
        store.set(key("a"), SaveBlob::new("va"));

        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, "{\"a\":\"va\"}");

        let back: BlobStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }
}
