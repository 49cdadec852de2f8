//! Port definitions (hexagonal architecture)
//!
//! Trait interfaces implemented by adapter crates: the cloud save backend
//! and the local persistence file.

pub mod cloud_backend;
pub mod local_store;

pub use cloud_backend::{CloudSaveBackend, RemoteSaveMeta};
pub use local_store::LocalStore;
