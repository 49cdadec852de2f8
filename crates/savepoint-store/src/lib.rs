//! Savepoint Store - local save file adapter
//!
//! Implements the [`LocalStore`](savepoint_core::ports::LocalStore) port
//! with a JSON document on disk, rewritten atomically on every persist.

pub mod file_store;

pub use file_store::FileStore;
