use anyhow::{Context, Result};
use async_trait::async_trait;

use sensorgate_types::ApiKey;

use super::users::DbPool;
use super::ApiKeyRepository;

#[derive(Debug, Clone, sqlx::FromRow)]
struct ApiKeyRow {
    api_key: String,
    revoked: bool,
    read_only: bool,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(row: ApiKeyRow) -> Self {
        ApiKey {
            key: row.api_key,
            revoked: row.revoked,
            read_only: row.read_only,
        }
    }
}

/// PostgreSQL-backed API key repository. Only sensor keys are relevant to
/// the gateway.
pub struct PgApiKeyRepository {
    pool: DbPool,
}

impl PgApiKeyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PgApiKeyRepository {
    async fn get_all_sensor_keys(&self) -> Result<Vec<ApiKey>> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT api_key, revoked, read_only
            FROM api_keys
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load sensor keys")?;

        Ok(rows.into_iter().map(ApiKey::from).collect())
    }

    async fn get_sensor_key(&self, key: &str) -> Result<Option<ApiKey>> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT api_key, revoked, read_only
            FROM api_keys
            WHERE api_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load sensor key")?;

        Ok(row.map(ApiKey::from))
    }
}
