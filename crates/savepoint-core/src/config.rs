//! Configuration module for Savepoint.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for Savepoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub local: LocalStoreConfig,
    pub cloud: CloudConfig,
    pub logging: LoggingConfig,
}

/// Local save file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStoreConfig {
    /// Name of the save document; becomes the file name on disk.
    pub save_id: String,
    /// Directory holding the save file.
    pub directory: PathBuf,
    /// Whether the file content is encoded (base64 layer) on disk.
    pub encode: bool,
    /// Reserved for content obfuscation beyond the encode layer.
    pub encode_password: Option<String>,
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            save_id: "savepoint".to_string(),
            directory: PathBuf::from("."),
            encode: false,
            encode_password: None,
        }
    }
}

/// Cloud backend selection and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Whether cloud mirroring is active at all.
    pub enabled: bool,
    /// Backend implementation: `http` or `keyring`.
    pub backend: String,
    /// Base URL of the HTTP save service (`http` backend only).
    pub base_url: Option<String>,
    /// Application identifier sent during authentication.
    pub app_id: Option<String>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: "http".to_string(),
            base_url: None,
            app_id: None,
        }
    }
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Optional path to a log file.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Validates cross-field constraints.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.local.save_id.trim().is_empty() {
            anyhow::bail!("local.save_id must not be empty");
        }
        match self.cloud.backend.as_str() {
            "http" => {
                if self.cloud.enabled && self.cloud.base_url.is_none() {
                    anyhow::bail!("cloud.base_url is required when the http backend is enabled");
                }
            }
            "keyring" => {}
            other => anyhow::bail!("unknown cloud.backend {other:?}; expected http or keyring"),
        }
        Ok(())
    }

    /// Full path of the local save file.
    #[must_use]
    pub fn save_file_path(&self) -> PathBuf {
        self.local
            .directory
            .join(format!("{}.json", self.local.save_id))
    }
}
