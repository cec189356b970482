use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::services::{DirectoryError, StorageError};

/// Errors surfaced by the proximity core
#[derive(Debug, Error)]
pub enum ProximityError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Missing coordinates: lat and lng are required")]
    MissingCoordinates,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(#[from] UpstreamError),
}

impl ProximityError {
    /// Only upstream failures are worth retrying; validation errors never are
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProximityError::UpstreamFailure(_))
    }
}

/// Failures of the collaborators behind the core
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("directory: {0}")]
    Directory(#[from] DirectoryError),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl From<StorageError> for ProximityError {
    fn from(err: StorageError) -> Self {
        ProximityError::UpstreamFailure(UpstreamError::Storage(err))
    }
}

impl From<DirectoryError> for ProximityError {
    fn from(err: DirectoryError) -> Self {
        ProximityError::UpstreamFailure(UpstreamError::Directory(err))
    }
}

/// Bound an upstream call by `timeout`, mapping expiry to a retryable failure
pub async fn with_timeout<T, E, F>(
    operation: &'static str,
    timeout: Duration,
    fut: F,
) -> Result<T, ProximityError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ProximityError>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!("{} timed out after {:?}", operation, timeout);
            Err(UpstreamError::Timeout {
                operation,
                timeout_ms: timeout.as_millis() as u64,
            }
            .into())
        }
    }
}
