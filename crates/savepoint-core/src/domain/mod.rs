//! Domain module - save/reconciliation entities and value types
//!
//! Pure logic only: nothing in this module performs I/O. Adapters and the
//! sync engine drive these types through the port traits.

pub mod batch;
pub mod capability;
pub mod errors;
pub mod newtypes;
pub mod store;
pub mod transfer;

pub use batch::LoadBatch;
pub use capability::CapabilityFlags;
pub use errors::DomainError;
pub use newtypes::{BatchId, SaveKey};
pub use store::{BlobStore, SaveBlob};
pub use transfer::{CloudTransfer, ConflictPolicy, TransferState};
