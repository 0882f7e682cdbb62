//! Seed dataset document.
//!
//! The dataset is loaded fully into memory before the run starts and is
//! read-only afterwards. Record fields are kept as raw JSON: whatever the
//! document holds is forwarded to the backend, and keys the document omits
//! stay omitted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only a missing key is `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Collects the fields that are present, in the given order.
fn present_fields(entries: &[(&str, &Option<Value>)]) -> Map<String, Value> {
    entries
        .iter()
        .filter_map(|&(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect()
}

/// A demo account. Password and role are forwarded as written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub username: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub password: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub address: Option<Value>,
}

impl UserRecord {
    pub fn to_fields(&self) -> Map<String, Value> {
        present_fields(&[
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
            ("role", &self.role),
            ("phone", &self.phone),
            ("address", &self.address),
        ])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryRecord {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub slug: Option<Value>,
}

impl CategoryRecord {
    pub fn to_fields(&self) -> Map<String, Value> {
        present_fields(&[("name", &self.name), ("slug", &self.slug)])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub stock: Option<Value>,
    /// Raw category reference as written in the dataset. Not resolved against
    /// the categories created by the run.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    /// Image file names, looked up in the uploads directory.
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductRecord {
    /// Product fields without `images`, which the seeder fills with the
    /// uploaded references.
    pub fn to_fields(&self) -> Map<String, Value> {
        present_fields(&[
            ("title", &self.title),
            ("description", &self.description),
            ("price", &self.price),
            ("stock", &self.stock),
            ("category", &self.category),
        ])
    }

    /// Title for log lines.
    pub fn label(&self) -> String {
        match &self.title {
            Some(Value::String(title)) => title.clone(),
            Some(other) => other.to_string(),
            None => "(untitled)".to_string(),
        }
    }
}

/// The three fixture collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeedDataset {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl SeedDataset {
    /// Reads and parses a dataset file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}
