//! HTTP cloud-save service adapter
//!
//! Speaks a small REST surface against the platform save service:
//!
//! - `POST /v1/auth` - session login, returns a bearer token and the
//!   account's cloud-save capability
//! - `GET /v1/saves` - metadata for every remote save file
//! - `POST /v1/saves/{name}/open` - opens a file with a conflict policy,
//!   creating it when absent
//! - `GET /v1/saves/{name}/content` - raw binary content
//! - `PUT /v1/saves/{name}/content` - commits new content; the updated
//!   description travels in the `x-save-description` header
//!
//! Non-success statuses are mapped to contextual errors; no retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use savepoint_core::domain::ConflictPolicy;
use savepoint_core::ports::{CloudSaveBackend, RemoteSaveMeta};

/// Login response from `POST /v1/auth`
#[derive(Debug, Deserialize)]
struct AuthResponse {
    /// Bearer token for subsequent requests
    token: String,
    /// Whether the account has cloud saves enabled
    cloud_saves_enabled: bool,
}

/// One save file entry as returned by the service
#[derive(Debug, Serialize, Deserialize)]
struct SaveFileDto {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    modified: Option<DateTime<Utc>>,
    #[serde(default)]
    played_secs: u64,
}

impl From<SaveFileDto> for RemoteSaveMeta {
    fn from(dto: SaveFileDto) -> Self {
        RemoteSaveMeta {
            file_name: dto.name,
            description: dto.description,
            modified: dto.modified,
            played_secs: dto.played_secs,
        }
    }
}

/// Request body for `POST /v1/saves/{name}/open`
#[derive(Debug, Serialize)]
struct OpenRequest {
    conflict_policy: ConflictPolicy,
}

/// Cloud save backend over the platform's HTTP save service
pub struct HttpSaveBackend {
    client: Client,
    base_url: String,
    app_id: Option<String>,
    token: RwLock<Option<String>>,
    cloud_saves_enabled: AtomicBool,
}

impl HttpSaveBackend {
    /// Creates a backend for the service at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Service root, without a trailing slash
    /// * `app_id` - Application identifier sent at login
    #[must_use]
    pub fn new(base_url: impl Into<String>, app_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            app_id,
            token: RwLock::new(None),
            cloud_saves_enabled: AtomicBool::new(false),
        }
    }

    /// Creates an authenticated request builder for the given method and path
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match self.token.read().expect("token lock poisoned").as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn encoded(name: &str) -> String {
        // Save keys are caller-controlled; keep them path-safe.
        name.replace('/', "%2F")
    }
}

#[async_trait::async_trait]
impl CloudSaveBackend for HttpSaveBackend {
    async fn authenticate(&self) -> Result<()> {
        debug!(base_url = %self.base_url, "Authenticating with cloud save service");

        let body = serde_json::json!({ "app_id": self.app_id });
        let response = self
            .request(Method::POST, "/v1/auth")
            .json(&body)
            .send()
            .await
            .context("Failed to reach cloud save service for login")?;

        if !response.status().is_success() {
            bail!("Login rejected by cloud save service: {}", response.status());
        }

        let auth: AuthResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        *self.token.write().expect("token lock poisoned") = Some(auth.token);
        self.cloud_saves_enabled
            .store(auth.cloud_saves_enabled, Ordering::SeqCst);

        info!(
            cloud_saves_enabled = auth.cloud_saves_enabled,
            "Logged in to cloud save service"
        );
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    fn cloud_save_enabled(&self) -> bool {
        self.cloud_saves_enabled.load(Ordering::SeqCst)
    }

    async fn fetch_all(&self) -> Result<Vec<RemoteSaveMeta>> {
        let response = self
            .request(Method::GET, "/v1/saves")
            .send()
            .await
            .context("Failed to fetch remote save list")?;

        if !response.status().is_success() {
            bail!("Fetch-all rejected: {}", response.status());
        }

        let files: Vec<SaveFileDto> = response
            .json()
            .await
            .context("Failed to parse remote save list")?;

        debug!(files = files.len(), "Fetched remote save list");
        Ok(files.into_iter().map(RemoteSaveMeta::from).collect())
    }

    async fn open(&self, name: &str, policy: ConflictPolicy) -> Result<RemoteSaveMeta> {
        let path = format!("/v1/saves/{}/open", Self::encoded(name));
        let response = self
            .request(Method::POST, &path)
            .json(&OpenRequest {
                conflict_policy: policy,
            })
            .send()
            .await
            .with_context(|| format!("Failed to open remote save {name:?}"))?;

        if !response.status().is_success() {
            bail!("Open rejected for {name:?}: {}", response.status());
        }

        let dto: SaveFileDto = response
            .json()
            .await
            .with_context(|| format!("Failed to parse open response for {name:?}"))?;

        debug!(file = name, policy = %policy, "Opened remote save");
        Ok(dto.into())
    }

    async fn read_binary(&self, meta: &RemoteSaveMeta) -> Result<Vec<u8>> {
        let path = format!("/v1/saves/{}/content", Self::encoded(&meta.file_name));
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .with_context(|| format!("Failed to read remote save {:?}", meta.file_name))?;

        match response.status() {
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read body of {:?}", meta.file_name))?;
                debug!(file = %meta.file_name, bytes = bytes.len(), "Read remote save content");
                Ok(bytes.to_vec())
            }
            StatusCode::NOT_FOUND => {
                warn!(file = %meta.file_name, "Remote save has no content");
                bail!("Remote save {:?} has no content", meta.file_name)
            }
            status => bail!("Read rejected for {:?}: {status}", meta.file_name),
        }
    }

    async fn commit(&self, meta: &RemoteSaveMeta, description: &str, data: &[u8]) -> Result<()> {
        let path = format!("/v1/saves/{}/content", Self::encoded(&meta.file_name));
        let response = self
            .request(Method::PUT, &path)
            .header("x-save-description", description)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await
            .with_context(|| format!("Failed to commit remote save {:?}", meta.file_name))?;

        if !response.status().is_success() {
            bail!("Commit rejected for {:?}: {}", meta.file_name, response.status());
        }

        info!(file = %meta.file_name, bytes = data.len(), "Committed remote save");
        Ok(())
    }
}
