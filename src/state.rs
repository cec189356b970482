use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{DirectoryBackend, Settings, StorageBackend};
use crate::core::{LocationStore, ProximityEngine};
use crate::services::{
    AppwriteDirectory, CachedDirectory, DirectoryError, KeyValueStore, MemoryDirectory, MemoryStore,
    PostgresStore, RedisStore, StorageError, UserDirectory,
};

/// Errors raised while wiring the service together
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Storage backend unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("Directory unavailable: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),
}

/// Application state shared across all handlers
///
/// Built once at startup and handed to every worker; there is no
/// module-level mutable state.
#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<LocationStore>,
    pub engine: ProximityEngine,
}

impl AppState {
    pub fn new(locations: Arc<LocationStore>, engine: ProximityEngine) -> Self {
        Self { locations, engine }
    }

    /// Build the store, directory and engine selected by `settings`
    pub async fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let timeout = settings.discovery.upstream_timeout();

        let backend = build_storage(settings).await?;
        tracing::info!("Location storage backend: {}", backend.backend_name());

        let locations = Arc::new(LocationStore::with_timeout(backend, timeout));

        let directory = build_directory(settings, timeout)?;
        let engine = ProximityEngine::new(directory, settings.discovery.proximity())
            .with_location_store(locations.clone());

        Ok(Self::new(locations, engine))
    }
}

async fn build_storage(settings: &Settings) -> Result<Arc<dyn KeyValueStore>, StartupError> {
    let storage = &settings.storage;

    let backend: Arc<dyn KeyValueStore> = match storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory location storage; records are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Redis => {
            let url = storage
                .redis_url
                .as_deref()
                .ok_or(StartupError::MissingSetting("storage.redis_url"))?;
            Arc::new(RedisStore::new(url).await?)
        }
        StorageBackend::Postgres => {
            let url = storage
                .database_url
                .as_deref()
                .ok_or(StartupError::MissingSetting("storage.database_url"))?;
            Arc::new(
                PostgresStore::from_settings(
                    url,
                    storage.max_connections,
                    storage.min_connections,
                    storage.acquire_timeout_secs,
                    storage.idle_timeout_secs,
                )
                .await?,
            )
        }
    };

    Ok(backend)
}

fn build_directory(
    settings: &Settings,
    timeout: Duration,
) -> Result<Arc<dyn UserDirectory>, StartupError> {
    let directory = &settings.directory;

    let inner: Arc<dyn UserDirectory> = match directory.backend {
        DirectoryBackend::Memory => Arc::new(MemoryDirectory::from_file(&directory.seed_file)?),
        DirectoryBackend::Appwrite => {
            let appwrite = directory
                .appwrite
                .clone()
                .ok_or(StartupError::MissingSetting("directory.appwrite"))?;
            tracing::info!("Using Appwrite directory at {}", appwrite.endpoint);
            Arc::new(AppwriteDirectory::new(
                appwrite.endpoint,
                appwrite.api_key,
                appwrite.project_id,
                appwrite.database_id,
                appwrite.collection,
                timeout,
            )?)
        }
    };

    if directory.cache_ttl_secs == 0 {
        return Ok(inner);
    }

    tracing::info!("Directory cache enabled (TTL: {}s)", directory.cache_ttl_secs);
    Ok(Arc::new(CachedDirectory::new(
        inner,
        Duration::from_secs(directory.cache_ttl_secs),
    )))
}
