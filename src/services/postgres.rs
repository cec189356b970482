use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;

use crate::services::storage::{KeyValueStore, StorageError};

/// PostgreSQL-backed key-value store
///
/// Entries live in the `kv_entries` table. Each write is a single upsert,
/// so a row is replaced as a whole.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StorageError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let query = r#"
            SELECT value
            FROM kv_entries
            WHERE key = $1
        "#;

        let row = sqlx::query(query).bind(key).fetch_optional(&self.pool).await?;

        Ok(row.map(|r| r.get("value")))
    }

    /// Uses INSERT ... ON CONFLICT so the latest write replaces the row
    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        let query = r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key)
            DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Upserted kv entry: {}", key);

        Ok(())
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>, StorageError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let query = r#"
            SELECT key, value
            FROM kv_entries
            WHERE key = ANY($1)
        "#;

        let rows = sqlx::query(query).bind(keys).fetch_all(&self.pool).await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StorageError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
