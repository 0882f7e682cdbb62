//! Configuration for a seed run, read from the environment.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid boolean for {name}: {value}")]
    InvalidBool { name: &'static str, value: String },
}

pub const DEFAULT_DATASET_PATH: &str = "data/seed-data.json";
pub const DEFAULT_UPLOADS_DIR: &str = "data/uploads";
pub const DEFAULT_API_URL: &str = "http://localhost:1337";
pub const DEFAULT_STATE_FILE: &str = ".seed-state.json";

/// Configuration for seeding operations.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Dataset document with `categories`, `products` and `users`.
    pub dataset_path: PathBuf,

    /// Directory searched for product image files.
    pub uploads_dir: PathBuf,

    /// Backend base URL, without a trailing slash.
    pub api_url: String,

    /// Bearer token sent with every backend request.
    pub api_token: Option<String>,

    /// When set, the first-run flag lives in the backend's core-store table.
    pub database_url: Option<String>,

    /// Settings file used when no database URL is configured.
    pub state_file: PathBuf,

    /// Missing image files fail the product instead of being skipped.
    pub strict_images: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            database_url: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            strict_images: false,
        }
    }
}

impl SeedConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let strict_images = match get("SEED_STRICT_IMAGES") {
            Some(value) => parse_bool("SEED_STRICT_IMAGES", &value)?,
            None => defaults.strict_images,
        };

        Ok(Self {
            dataset_path: get("SEED_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.dataset_path),
            uploads_dir: get("SEED_UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            api_url: get("STRAPI_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_token: get("STRAPI_API_TOKEN"),
            database_url: get("DATABASE_URL"),
            state_file: get("SEED_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_file),
            strict_images,
        })
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}
