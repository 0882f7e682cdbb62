//! Settings kept in the CMS core-store table.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use tracing::debug;

use super::{SettingsNamespace, SettingsStore, StoreError, value_type_name};

/// Settings store over `strapi_core_store_settings`.
///
/// Rows are keyed by `{type}_{name}_{key}`, with the JSON-encoded value in
/// `value` and its JSON kind in `type`.
#[derive(Clone, Debug)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
    ) -> Result<Option<Value>, StoreError> {
        let storage_key = namespace.storage_key(key);

        let row = sqlx::query(
            r#"
            SELECT value
            FROM strapi_core_store_settings
            WHERE key = $1
            LIMIT 1
            "#,
        )
        .bind(&storage_key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: Option<String> = row.try_get("value")?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        namespace: &SettingsNamespace,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let storage_key = namespace.storage_key(key);
        let raw = serde_json::to_string(&value)?;
        let value_type = value_type_name(&value);

        let updated = sqlx::query(
            r#"
            UPDATE strapi_core_store_settings
            SET value = $2, type = $3
            WHERE key = $1
            "#,
        )
        .bind(&storage_key)
        .bind(&raw)
        .bind(value_type)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            sqlx::query(
                r#"
                INSERT INTO strapi_core_store_settings (key, value, type)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(&storage_key)
            .bind(&raw)
            .bind(value_type)
            .execute(&self.pool)
            .await?;
        }

        debug!("Stored setting {storage_key}");
        Ok(())
    }
}
