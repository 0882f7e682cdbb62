//! First-run demo data seeding for the storefront CMS.
//!
//! This crate populates a fresh backend with demonstration users, categories,
//! products (with their images uploaded) and a sample order. A persisted
//! `initHasRun` flag guards against importing the same data twice.
//!
//! The backend is reached through three narrow collaborators:
//! - [`SettingsStore`](store::SettingsStore): typed key-value settings holding the flag
//! - [`EntityStore`](store::EntityStore): creates records of a named kind
//! - [`FileUploader`](store::FileUploader): stores local files and returns references
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_seed::prelude::*;
//!
//! let config = SeedConfig::from_env()?;
//! let dataset = SeedDataset::load(&config.dataset_path)?;
//! let client = Arc::new(StrapiClient::new(&config.api_url, config.api_token.clone()));
//! let settings = Arc::new(FileSettingsStore::new(&config.state_file));
//!
//! let outcome = Seeder::new(settings, client.clone(), client, dataset)
//!     .with_images(ImageResolver::new(&config.uploads_dir))
//!     .run()
//!     .await?;
//! ```

pub mod api;
pub mod config;
pub mod dataset;
pub mod images;
pub mod seeder;
pub mod store;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::api::{ApiError, StrapiClient};
    pub use crate::config::{ConfigError, SeedConfig};
    pub use crate::dataset::{CategoryRecord, ProductRecord, SeedDataset, UserRecord};
    pub use crate::images::{ImageError, ImageResolver};
    pub use crate::seeder::{KindReport, SeedOutcome, SeedReport, Seeder};
    pub use crate::store::{
        EntityKind, EntityStore, FileDescriptor, FileSettingsStore, FileUploader,
        PgSettingsStore, SettingsNamespace, SettingsStore, StoreError, StoredFile,
    };
}
