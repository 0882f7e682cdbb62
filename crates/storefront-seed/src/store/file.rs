//! Settings persisted to a local JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use super::{SettingsNamespace, SettingsStore, StoreError};

/// JSON object on disk, keyed by `{type}_{name}_{key}`.
///
/// A missing file reads as empty. Every `set` rewrites the whole file.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Map::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        let settings = self.read_all().await?;
        Ok(settings.get(&namespace.storage_key(key)).cloned())
    }

    async fn set(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut settings = self.read_all().await?;
        let storage_key = namespace.storage_key(key);
        settings.insert(storage_key.clone(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(&Value::Object(settings))?;
        tokio::fs::write(&self.path, contents).await?;

        debug!("Stored setting {storage_key} in {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("state.json"));
        let ns = SettingsNamespace::new("type", "setup");

        assert_eq!(store.get(&ns, "initHasRun").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let ns = SettingsNamespace::new("type", "setup");

        FileSettingsStore::new(&path)
            .set(&ns, "initHasRun", json!(true))
            .await
            .unwrap();

        let reopened = FileSettingsStore::new(&path);
        assert_eq!(
            reopened.get(&ns, "initHasRun").await.unwrap(),
            Some(json!(true))
        );

        let contents = std::fs::read_to_string(&path).unwrap();
        let raw: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(raw["type_setup_initHasRun"], json!(true));
    }

    #[tokio::test]
    async fn test_set_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("state.json"));
        let setup = SettingsNamespace::new("type", "setup");
        let other = SettingsNamespace::new("plugin", "upload");

        store
            .set(&other, "settings", json!({"sizeOptimization": true}))
            .await
            .unwrap();
        store.set(&setup, "initHasRun", json!(true)).await.unwrap();

        assert_eq!(
            store.get(&other, "settings").await.unwrap(),
            Some(json!({"sizeOptimization": true}))
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[not an object").unwrap();

        let store = FileSettingsStore::new(&path);
        let ns = SettingsNamespace::new("type", "setup");
        assert!(matches!(
            store.get(&ns, "initHasRun").await,
            Err(StoreError::Serialization(_))
        ));
    }
}
