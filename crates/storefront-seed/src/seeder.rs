//! First-run seeding workflow.
//!
//! A run reads the `initHasRun` flag, claims it when unset, and then imports
//! users, categories, products and the demo order, one record at a time.
//! Record failures are logged and counted; they never stop the run.

use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::dataset::{CategoryRecord, ProductRecord, SeedDataset, UserRecord};
use crate::images::ImageResolver;
use crate::store::{
    EntityKind, EntityStore, FileUploader, SettingsNamespace, SettingsStore, StoreError,
};

/// Settings namespace type of the first-run flag.
pub const SETUP_NAMESPACE_TYPE: &str = "type";
/// Settings namespace name of the first-run flag.
pub const SETUP_NAMESPACE_NAME: &str = "setup";
/// Key of the first-run flag.
pub const INIT_FLAG_KEY: &str = "initHasRun";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("First-run flag unavailable: {0}")]
    Flag(#[from] StoreError),
}

/// Created/failed counts for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindReport {
    pub created: usize,
    pub failed: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: KindReport,
    pub categories: KindReport,
    pub products: KindReport,
    pub orders: KindReport,
    pub images_uploaded: usize,
}

impl SeedReport {
    pub fn kind(&self, kind: EntityKind) -> &KindReport {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Category => &self.categories,
            EntityKind::Product => &self.products,
            EntityKind::Order => &self.orders,
        }
    }

    fn kind_mut(&mut self, kind: EntityKind) -> &mut KindReport {
        match kind {
            EntityKind::User => &mut self.users,
            EntityKind::Category => &mut self.categories,
            EntityKind::Product => &mut self.products,
            EntityKind::Order => &mut self.orders,
        }
    }

    pub fn total_failed(&self) -> usize {
        EntityKind::ALL.iter().map(|k| self.kind(*k).failed).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The flag was already set; nothing was created or uploaded.
    Skipped,
    /// The import ran. Individual records may still have failed.
    Completed(SeedReport),
}

/// Drives one seed run against the injected collaborators.
pub struct Seeder {
    settings: Arc<dyn SettingsStore>,
    entities: Arc<dyn EntityStore>,
    uploader: Arc<dyn FileUploader>,
    dataset: SeedDataset,
    images: ImageResolver,
}

impl Seeder {
    /// Creates a seeder that looks for images in the default uploads directory.
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        entities: Arc<dyn EntityStore>,
        uploader: Arc<dyn FileUploader>,
        dataset: SeedDataset,
    ) -> Self {
        Self {
            settings,
            entities,
            uploader,
            dataset,
            images: ImageResolver::new(crate::config::DEFAULT_UPLOADS_DIR),
        }
    }

    pub fn with_images(mut self, images: ImageResolver) -> Self {
        self.images = images;
        self
    }

    fn setup_namespace() -> SettingsNamespace {
        SettingsNamespace::new(SETUP_NAMESPACE_TYPE, SETUP_NAMESPACE_NAME)
    }

    /// Returns true if this is the first run, setting the flag before any
    /// import work starts.
    pub async fn claim_first_run(&self) -> Result<bool, SeedError> {
        let namespace = Self::setup_namespace();
        let has_run = self
            .settings
            .get(&namespace, INIT_FLAG_KEY)
            .await?
            .is_some_and(|value| is_truthy(&value));

        if has_run {
            return Ok(false);
        }

        self.settings
            .set(&namespace, INIT_FLAG_KEY, Value::Bool(true))
            .await?;
        Ok(true)
    }

    /// Runs the seed workflow once.
    ///
    /// Only failures to read or write the first-run flag are returned as
    /// errors.
    pub async fn run(&self) -> Result<SeedOutcome, SeedError> {
        if !self.claim_first_run().await? {
            info!("Seed data was already imported, skipping");
            return Ok(SeedOutcome::Skipped);
        }

        info!("Seeding demo data...");

        let mut report = SeedReport::default();
        self.import_users(&mut report).await;
        self.import_categories(&mut report).await;
        self.import_products(&mut report).await;
        self.import_orders(&mut report).await;

        info!("Seed completed!");
        for kind in EntityKind::ALL {
            let counts = report.kind(kind);
            info!(
                "  {}: {} created, {} failed",
                kind.collection(),
                counts.created,
                counts.failed
            );
        }
        info!("  images: {} uploaded", report.images_uploaded);

        Ok(SeedOutcome::Completed(report))
    }

    async fn import_users(&self, report: &mut SeedReport) {
        info!("Seeding {} users...", self.dataset.users.len());
        for user in &self.dataset.users {
            self.create_entry(EntityKind::User, user_fields(user), report).await;
        }
    }

    async fn import_categories(&self, report: &mut SeedReport) {
        info!("Seeding {} categories...", self.dataset.categories.len());
        for category in &self.dataset.categories {
            self.create_entry(EntityKind::Category, category_fields(category), report).await;
        }
    }

    async fn import_products(&self, report: &mut SeedReport) {
        info!("Seeding {} products...", self.dataset.products.len());
        for product in &self.dataset.products {
            let images = match self
                .images
                .resolve_images(self.uploader.as_ref(), &product.images)
                .await
            {
                Ok(images) => images,
                Err(e) => {
                    error!(
                        entity = %EntityKind::Product,
                        "Failed to create product {}: {e}",
                        product.label()
                    );
                    report.products.failed += 1;
                    continue;
                }
            };
            report.images_uploaded += images.len();

            let fields = product_fields(product, json!(images));
            self.create_entry(EntityKind::Product, fields, report).await;
        }
    }

    async fn import_orders(&self, report: &mut SeedReport) {
        info!("Seeding demo order...");
        self.create_entry(EntityKind::Order, demo_order(), report).await;
    }

    /// Creates one record; failures are logged and counted, never returned.
    async fn create_entry(&self, kind: EntityKind, data: Value, report: &mut SeedReport) {
        match self.entities.create(kind, data).await {
            Ok(created) => {
                debug!("Created {kind}: {created}");
                report.kind_mut(kind).created += 1;
            }
            Err(e) => {
                error!(entity = %kind, "Failed to create {kind}: {e}");
                report.kind_mut(kind).failed += 1;
            }
        }
    }
}

fn user_fields(user: &UserRecord) -> Value {
    Value::Object(user.to_fields())
}

fn category_fields(category: &CategoryRecord) -> Value {
    Value::Object(category.to_fields())
}

fn product_fields(product: &ProductRecord, images: Value) -> Value {
    let mut fields = product.to_fields();
    fields.insert("images".to_string(), images);
    Value::Object(fields)
}

/// The fixed demonstration order. User and product ids are literals and are
/// not checked against the records created by the run.
pub fn demo_order() -> Value {
    json!({
        "user": 1,
        "products": [
            { "product": 1, "quantity": 2, "price": 199.99 },
            { "product": 3, "quantity": 1, "price": 49.99 },
        ],
        "totalPrice": 449.97,
        "status": "pending",
    })
}

/// Flag values written by other tools may not be plain booleans.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
