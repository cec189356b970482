use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur with storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Key-value persistence capability behind the location store
///
/// A `put` replaces the whole value for a key in one step; readers observe
/// either the previous value or the new one.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Fetch several keys at once; missing keys are absent from the map
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>, StorageError> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key).await? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    async fn health_check(&self) -> Result<bool, StorageError> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str;
}

/// Process-local store
///
/// Suitable for a single-process deployment only: nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Storage key builder
pub struct StorageKey;

impl StorageKey {
    /// Build a storage key for a user's shared location
    pub fn location(user_id: &str) -> String {
        format!("location:{}", user_id)
    }
}
