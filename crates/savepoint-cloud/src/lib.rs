//! Savepoint Cloud - cloud save backend adapters
//!
//! Two implementations of the
//! [`CloudSaveBackend`](savepoint_core::ports::CloudSaveBackend) port:
//!
//! - [`HttpSaveBackend`] - a platform cloud-save service spoken over HTTP
//! - [`KeyringSaveBackend`] - the OS credential store, for platforms whose
//!   cloud saves ride on the system keychain
//!
//! The implementation is selected once at configuration time via
//! [`backend_from_config`]; nothing downstream branches on platform.

pub mod http;
pub mod keyring_store;

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use savepoint_core::config::CloudConfig;
use savepoint_core::ports::CloudSaveBackend;

pub use http::HttpSaveBackend;
pub use keyring_store::KeyringSaveBackend;

/// Builds the configured cloud backend
pub fn backend_from_config(config: &CloudConfig) -> Result<Arc<dyn CloudSaveBackend>> {
    match config.backend.as_str() {
        "http" => {
            let base_url = config
                .base_url
                .as_deref()
                .context("cloud.base_url is required for the http backend")?;
            Ok(Arc::new(HttpSaveBackend::new(
                base_url,
                config.app_id.clone(),
            )))
        }
        "keyring" => Ok(Arc::new(KeyringSaveBackend::new("savepoint"))),
        other => bail!("unknown cloud backend {other:?}"),
    }
}
