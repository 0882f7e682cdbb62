//! Seeds the storefront CMS with demo data on its first run.
//!
//! Run with:
//! ```
//! STRAPI_URL=http://localhost:1337 STRAPI_API_TOKEN=... cargo run -p storefront-seed --bin seed
//! ```
//!
//! Exits 0 whenever the seed logic ran, even if some records failed; a
//! bootstrap failure (configuration, dataset, backend, first-run flag) exits 1.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use storefront_seed::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SeedConfig::from_env()?;
    let dataset = SeedDataset::load(&config.dataset_path)?;

    let client = Arc::new(StrapiClient::new(&config.api_url, config.api_token.clone()));
    client.check_health().await?;

    tracing::info!("Connected to backend at {}", client.base_url());

    let settings: Arc<dyn SettingsStore> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(1)
                .connect(database_url)
                .await?;
            tracing::info!("Using core-store settings table");
            Arc::new(PgSettingsStore::new(pool))
        }
        None => {
            let store = FileSettingsStore::new(&config.state_file);
            tracing::info!("Using settings file {}", store.path().display());
            Arc::new(store)
        }
    };

    let images = ImageResolver::new(&config.uploads_dir).strict(config.strict_images);
    tracing::info!("Reading images from {}", images.uploads_dir().display());

    let outcome = Seeder::new(settings, client.clone(), client, dataset)
        .with_images(images)
        .run()
        .await?;

    if let SeedOutcome::Completed(report) = outcome {
        let failed = report.total_failed();
        if failed > 0 {
            tracing::warn!("{failed} records failed to import, see errors above");
        }
    }

    Ok(())
}
