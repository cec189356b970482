use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{CandidateUser, GeoPoint};

/// Errors that can occur when reading the user directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Failed to load seed file: {0}")]
    SeedError(String),
}

/// Source of discoverable users
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every candidate, in the directory's natural order
    async fn candidates(&self) -> Result<Vec<CandidateUser>, DirectoryError>;

    /// Candidates that may lie within `radius_m` of `origin`
    ///
    /// May return a superset; callers apply the exact distance check.
    async fn candidates_near(
        &self,
        _origin: GeoPoint,
        _radius_m: f64,
    ) -> Result<Vec<CandidateUser>, DirectoryError> {
        self.candidates().await
    }

    async fn health_check(&self) -> Result<bool, DirectoryError> {
        Ok(true)
    }
}

/// Fixed, in-process population of users
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: Vec<CandidateUser>,
}

impl MemoryDirectory {
    pub fn new(users: Vec<CandidateUser>) -> Self {
        Self { users }
    }

    /// Load users from a JSON array on disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DirectoryError::SeedError(format!("{}: {}", path.display(), e)))?;
        let users: Vec<CandidateUser> = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::SeedError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Loaded {} directory users from {}", users.len(), path.display());
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn candidates(&self) -> Result<Vec<CandidateUser>, DirectoryError> {
        Ok(self.users.clone())
    }
}

/// Caches the full candidate list of another directory for a TTL
pub struct CachedDirectory {
    inner: Arc<dyn UserDirectory>,
    cache: moka::future::Cache<(), Arc<Vec<CandidateUser>>>,
}

impl CachedDirectory {
    pub fn new(inner: Arc<dyn UserDirectory>, ttl: Duration) -> Self {
        let cache = moka::future::CacheBuilder::new(1)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    /// Drop the cached population so the next call refetches
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

#[async_trait]
impl UserDirectory for CachedDirectory {
    async fn candidates(&self) -> Result<Vec<CandidateUser>, DirectoryError> {
        if let Some(users) = self.cache.get(&()).await {
            tracing::trace!("Directory cache hit ({} users)", users.len());
            return Ok(users.as_ref().clone());
        }

        let users = Arc::new(self.inner.candidates().await?);
        tracing::debug!("Directory cache refreshed ({} users)", users.len());
        self.cache.insert((), users.clone()).await;

        Ok(users.as_ref().clone())
    }

    async fn health_check(&self) -> Result<bool, DirectoryError> {
        self.inner.health_check().await
    }
}
