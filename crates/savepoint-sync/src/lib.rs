//! Savepoint Sync - reconciliation engine and save facade
//!
//! [`SaveService`] is the public surface of the save layer: `save`, `load`,
//! `try_load`, `cloud_save` and `load_resources`. [`ReconcileEngine`]
//! drives the per-file open/read-or-write/commit protocol against the cloud
//! backend and merges remote payloads into the local blob store at startup.

pub mod engine;
pub mod error;
pub mod service;

pub use engine::ReconcileEngine;
pub use error::SyncError;
pub use service::SaveService;
