//! Local persistence port (driven/secondary port)
//!
//! Interface for the file that backs the in-memory [`BlobStore`]. The file
//! is rewritten wholesale after every mutation; its encoding parameters are
//! adapter configuration, not part of the core algorithm.

use std::collections::HashMap;

use crate::domain::newtypes::SaveKey;
use crate::domain::store::{BlobStore, SaveBlob};

/// Port trait for the local save file
///
/// Load and persist are synchronous by contract: the store is mutated and
/// flushed from a single logical caller, and the save file is small.
pub trait LocalStore: Send + Sync {
    /// Loads the persisted mapping.
    ///
    /// A missing file is not an error; it yields an empty mapping.
    fn load(&self) -> anyhow::Result<HashMap<SaveKey, SaveBlob>>;

    /// Atomically rewrites the entire save file from `store`.
    ///
    /// Never a partial append: the replacement is all-or-nothing.
    fn persist(&self, store: &BlobStore) -> anyhow::Result<()>;
}
