//! In-memory collaborators that record every call in a shared journal.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use storefront_seed::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(EntityKind, Value),
    Upload(String),
}

pub type Journal = Arc<Mutex<Vec<Call>>>;

#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn raw(&self, storage_key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(storage_key).cloned()
    }

    pub fn insert(&self, storage_key: &str, value: Value) {
        self.values
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), value);
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.raw(&namespace.storage_key(key)))
    }

    async fn set(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.insert(&namespace.storage_key(key), value);
        Ok(())
    }
}

/// Settings store whose reads always fail.
pub struct BrokenSettings;

#[async_trait]
impl SettingsStore for BrokenSettings {
    async fn get(&self, _: &SettingsNamespace, _: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Rejected("settings offline".to_string()))
    }

    async fn set(&self, _: &SettingsNamespace, _: &str, _: Value) -> Result<(), StoreError> {
        Err(StoreError::Rejected("settings offline".to_string()))
    }
}

pub struct RecordingEntities {
    journal: Journal,
    attempts: Mutex<HashMap<EntityKind, usize>>,
    /// `(kind, n)` fails the n-th (0-based) create of that kind.
    fail_on: HashSet<(EntityKind, usize)>,
}

impl RecordingEntities {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            attempts: Mutex::new(HashMap::new()),
            fail_on: HashSet::new(),
        }
    }

    pub fn failing(mut self, kind: EntityKind, index: usize) -> Self {
        self.fail_on.insert((kind, index));
        self
    }
}

#[async_trait]
impl EntityStore for RecordingEntities {
    async fn create(&self, kind: EntityKind, data: Value) -> Result<Value, StoreError> {
        self.journal
            .lock()
            .unwrap()
            .push(Call::Create(kind, data.clone()));

        let index = {
            let mut attempts = self.attempts.lock().unwrap();
            let counter = attempts.entry(kind).or_insert(0);
            let index = *counter;
            *counter += 1;
            index
        };

        if self.fail_on.contains(&(kind, index)) {
            return Err(StoreError::Rejected(format!("{kind} #{index} rejected")));
        }
        Ok(data)
    }
}

pub struct RecordingUploader {
    journal: Journal,
    next_id: Mutex<u64>,
    /// Uploads of these file names are rejected.
    fail_on: HashSet<String>,
    /// Uploads of these file names succeed but return no reference.
    empty_on: HashSet<String>,
}

impl RecordingUploader {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            next_id: Mutex::new(1),
            fail_on: HashSet::new(),
            empty_on: HashSet::new(),
        }
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.fail_on.insert(name.to_string());
        self
    }

    pub fn empty(mut self, name: &str) -> Self {
        self.empty_on.insert(name.to_string());
        self
    }
}

#[async_trait]
impl FileUploader for RecordingUploader {
    async fn upload(&self, file: &FileDescriptor) -> Result<Vec<StoredFile>, StoreError> {
        self.journal
            .lock()
            .unwrap()
            .push(Call::Upload(file.name.clone()));

        if self.fail_on.contains(&file.name) {
            return Err(StoreError::Rejected(format!("upload of {} rejected", file.name)));
        }
        if self.empty_on.contains(&file.name) {
            return Ok(Vec::new());
        }

        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;

        Ok(vec![StoredFile {
            id,
            name: file.name.clone(),
            url: Some(format!("/uploads/{}", file.name)),
            mime: Some(file.mime.clone()),
        }])
    }
}

/// Fake backend wired into a [`Seeder`].
pub struct Harness {
    pub journal: Journal,
    pub settings: Arc<MemorySettings>,
    pub entities: Arc<RecordingEntities>,
    pub uploader: Arc<RecordingUploader>,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self::with_entities(RecordingEntities::new(journal.clone()), journal)
    }

    pub fn with_entities(entities: RecordingEntities, journal: Journal) -> Self {
        Self {
            settings: Arc::new(MemorySettings::default()),
            entities: Arc::new(entities),
            uploader: Arc::new(RecordingUploader::new(journal.clone())),
            journal,
        }
    }

    pub fn with_uploader(mut self, uploader: RecordingUploader) -> Self {
        self.uploader = Arc::new(uploader);
        self
    }

    pub fn seeder(&self, dataset: SeedDataset, images: ImageResolver) -> Seeder {
        Seeder::new(
            self.settings.clone(),
            self.entities.clone(),
            self.uploader.clone(),
            dataset,
        )
        .with_images(images)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.lock().unwrap().clone()
    }

    pub fn creates(&self, kind: EntityKind) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create(k, data) if k == kind => Some(data),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Upload(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

pub fn user(username: &str) -> UserRecord {
    UserRecord {
        username: Some(Value::from(username)),
        email: Some(Value::from(format!("{username}@example.com"))),
        password: Some(Value::from("password123")),
        role: Some(Value::from("customer")),
        phone: Some(Value::from("+1 555 0100")),
        address: None,
    }
}

pub fn category(name: &str) -> CategoryRecord {
    CategoryRecord {
        name: Some(Value::from(name)),
        slug: Some(Value::from(name.to_lowercase())),
    }
}

pub fn product(title: &str, images: &[&str]) -> ProductRecord {
    ProductRecord {
        title: Some(Value::from(title)),
        description: Some(Value::from(format!("{title} description"))),
        price: Some(Value::from(199.99)),
        stock: Some(Value::from(10)),
        category: Some(Value::from(1)),
        images: images.iter().map(|s| s.to_string()).collect(),
    }
}
