//! HTTP client for the CMS REST API.
//!
//! Creates entities through `/api/{collection}` and stores files through the
//! upload plugin at `/api/upload`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::store::{
    EntityKind, EntityStore, FileDescriptor, FileUploader, StoreError, StoredFile,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
    #[error("Create {kind} failed: {message}")]
    CreateFailed { kind: EntityKind, message: String },
    #[error("Upload failed: {0}")]
    UploadFailed(String),
    #[error("Backend not reachable at {0}")]
    BackendNotReachable(String),
}

/// REST client implementing [`EntityStore`] and [`FileUploader`].
pub struct StrapiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl StrapiClient {
    /// Creates a client for the given backend URL.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Checks if the backend is reachable.
    pub async fn check_health(&self) -> Result<(), ApiError> {
        let url = format!("{}/_health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(ApiError::BackendNotReachable(format!(
                "{url}: health check returned status {}",
                resp.status()
            ))),
            Err(e) => Err(ApiError::BackendNotReachable(format!("{url}: {e}"))),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Creates one record and returns the backend's JSON response.
    pub async fn create_entity(&self, kind: EntityKind, data: Value) -> Result<Value, ApiError> {
        let url = format!("{}/api/{}", self.base_url, kind.collection());

        debug!("Creating {kind} via {url}");

        let resp = self
            .authorized(self.client.post(&url))
            .json(&request_body(kind, data))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::CreateFailed {
                kind,
                message: format!("Status {status}: {body}"),
            });
        }

        Ok(resp.json().await?)
    }

    /// Uploads a local file through the upload plugin.
    pub async fn upload_file(&self, file: &FileDescriptor) -> Result<Vec<StoredFile>, ApiError> {
        let url = format!("{}/api/upload", self.base_url);

        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ApiError::ReadFile {
                path: file.path.display().to_string(),
                source,
            })?;

        let file_part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| ApiError::UploadFailed(e.to_string()))?;

        let form = Form::new().part("files", file_part);

        debug!("Uploading {} ({})", file.name, file.mime);

        let resp = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::UploadFailed(format!("Status {status}: {body}")));
        }

        let stored: Vec<StoredFile> = resp.json().await?;
        if stored.is_empty() {
            return Err(ApiError::UploadFailed(format!(
                "No file returned for {}",
                file.name
            )));
        }
        Ok(stored)
    }
}

/// Content types take their fields under `data`; the users endpoint takes
/// them at the top level.
fn request_body(kind: EntityKind, data: Value) -> Value {
    match kind {
        EntityKind::User => data,
        _ => json!({ "data": data }),
    }
}

/// Media fields are linked by stored-file id.
fn media_ids(images: &Value) -> Option<Value> {
    let files = images.as_array()?;
    files
        .iter()
        .map(|file| file.get("id").cloned())
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

#[async_trait]
impl EntityStore for StrapiClient {
    async fn create(&self, kind: EntityKind, mut data: Value) -> Result<Value, StoreError> {
        if kind == EntityKind::Product {
            if let Some(ids) = data.get("images").and_then(media_ids) {
                data["images"] = ids;
            }
        }
        Ok(self.create_entity(kind, data).await?)
    }
}

#[async_trait]
impl FileUploader for StrapiClient {
    async fn upload(&self, file: &FileDescriptor) -> Result<Vec<StoredFile>, StoreError> {
        Ok(self.upload_file(file).await?)
    }
}
