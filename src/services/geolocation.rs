use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::core::{LocationStore, ProximityError};
use crate::models::{GeoPoint, LocationRecord};

/// Default wait for a position fix
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(15);

/// Reasons a device position could not be obtained
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Geolocation not supported")]
    Unsupported,

    #[error("Permission to read location denied")]
    Denied,

    #[error("Timed out waiting for a position fix")]
    Timeout,

    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// Single-shot source of the device's current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, GeolocationError>;
}

/// Provider that always reports one configured position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    position: GeoPoint,
}

impl FixedLocationProvider {
    pub fn new(position: GeoPoint) -> Self {
        Self { position }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self) -> Result<GeoPoint, GeolocationError> {
        Ok(self.position)
    }
}

/// Provider for hosts without any location service
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProvider;

#[async_trait]
impl LocationProvider for UnsupportedProvider {
    async fn current_position(&self) -> Result<GeoPoint, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Ask `provider` for a position, giving up after `timeout`
pub async fn acquire_location(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<GeoPoint, GeolocationError> {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}

/// Failure of the acquire-then-store flow
#[derive(Debug, Error)]
pub enum ShareLocationError {
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error(transparent)]
    Store(#[from] ProximityError),
}

/// Acquire the current position and store it for `user_id`
pub async fn share_current_location(
    provider: &dyn LocationProvider,
    store: &LocationStore,
    user_id: &str,
    radius_hint: Option<f64>,
    timeout: Duration,
) -> Result<LocationRecord, ShareLocationError> {
    let position = acquire_location(provider, timeout).await?;
    let record = store.put(user_id, position.lat, position.lng, radius_hint).await?;
    Ok(record)
}
