//! Backend collaborators driven by the seeder.
//!
//! Each collaborator is a narrow async trait so a run can be pointed at the
//! real CMS or at in-memory fakes:
//! - [`SettingsStore`]: typed key-value settings keyed by namespace and key
//! - [`EntityStore`]: create a record of an [`EntityKind`]
//! - [`FileUploader`]: persist a local file and return [`StoredFile`] references

mod file;
mod postgres;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::api::ApiError;

pub use file::FileSettingsStore;
pub use postgres::PgSettingsStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),
    #[error("Rejected by store: {0}")]
    Rejected(String),
}

/// Record types the seeder creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Category,
    Product,
    Order,
}

impl EntityKind {
    /// Import order of a seed run.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Category,
        EntityKind::Product,
        EntityKind::Order,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Category => "category",
            EntityKind::Product => "product",
            EntityKind::Order => "order",
        }
    }

    /// REST collection segment under `/api`.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Category => "categories",
            EntityKind::Product => "products",
            EntityKind::Order => "orders",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{type, name}` scope of a settings entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingsNamespace {
    pub kind: String,
    pub name: String,
}

impl SettingsNamespace {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Flat storage key for `key` in this namespace: `{type}_{name}_{key}`.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}_{}_{}", self.kind, self.name, key)
    }
}

/// A local file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
}

/// The uploader's handle to a persisted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
    ) -> Result<Option<Value>, StoreError>;

    async fn set(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Creates one record and returns it as the store echoes it back.
    async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, StoreError>;
}

#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Uploads one file. The store may answer with more than one reference.
    async fn upload(&self, file: &FileDescriptor) -> Result<Vec<StoredFile>, StoreError>;
}

/// JSON kind name stored alongside a settings value.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "object",
    }
}
