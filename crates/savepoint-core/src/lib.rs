//! Savepoint Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `BlobStore`, `LoadBatch`, `CloudTransfer`, `CapabilityFlags`
//! - **Serialization** - the `Saveable` trait and the exclusion-aware `Serializer`
//! - **Port definitions** - Traits for adapters: `CloudSaveBackend`, `LocalStore`
//! - **Wire codec** - binary framing for payloads on the cloud read/write path
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure save/reconciliation logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.

pub mod config;
pub mod domain;
pub mod ports;
pub mod serialize;
pub mod wire;
