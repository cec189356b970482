use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::core::error::{with_timeout, ProximityError};
use crate::models::{GeoPoint, LocationRecord};
use crate::services::{KeyValueStore, StorageError, StorageKey};

/// Smallest discovery radius a user may configure, in meters
pub const MIN_RADIUS_M: u32 = 500;

/// Largest discovery radius a user may configure, in meters
pub const MAX_RADIUS_M: u32 = 2000;

/// Radius used when the client does not send a usable one
pub const DEFAULT_RADIUS_M: u32 = 1000;

/// Decimal places kept from device coordinates (~1.1 m)
const COORDINATE_SCALE: f64 = 1e5;

const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(3);

/// Round a coordinate to 5 decimal places, halves away from zero
#[inline]
pub fn round_coordinate(value: f64) -> f64 {
    (value * COORDINATE_SCALE).round() / COORDINATE_SCALE
}

/// Clamp a radius hint into the allowed range
///
/// Absent or non-finite hints fall back to the default radius.
pub fn clamp_radius(hint: Option<f64>) -> u32 {
    match hint {
        Some(r) if r.is_finite() => r
            .clamp(MIN_RADIUS_M as f64, MAX_RADIUS_M as f64)
            .round() as u32,
        _ => DEFAULT_RADIUS_M,
    }
}

/// Validate and round raw device coordinates
pub fn sanitize_coordinates(lat: f64, lng: f64) -> Result<GeoPoint, ProximityError> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(ProximityError::InvalidCoordinate(format!(
            "coordinates must be finite numbers, got ({}, {})",
            lat, lng
        )));
    }

    let point = GeoPoint::new(round_coordinate(lat), round_coordinate(lng));
    if !point.is_in_range() {
        return Err(ProximityError::InvalidCoordinate(format!(
            "coordinates out of range: ({}, {})",
            lat, lng
        )));
    }

    Ok(point)
}

/// Owner of every user's shared location
///
/// Writes for one identity are serialised, and the timestamp is taken
/// while holding that identity's lock, so the record a later `get` sees is
/// always the one with the newest `updated_at`.
pub struct LocationStore {
    backend: Arc<dyn KeyValueStore>,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    timeout: Duration,
}

impl LocationStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_timeout(backend, DEFAULT_UPSTREAM_TIMEOUT)
    }

    pub fn with_timeout(backend: Arc<dyn KeyValueStore>, timeout: Duration) -> Self {
        Self {
            backend,
            write_locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn backend(&self) -> &dyn KeyValueStore {
        self.backend.as_ref()
    }

    /// Store a user's location, replacing any previous record
    ///
    /// # Arguments
    /// * `user_id` - Identity owning the record
    /// * `lat`, `lng` - Raw device coordinates in degrees
    /// * `radius_hint` - Requested discovery radius in meters
    ///
    /// # Returns
    /// The record as persisted (rounded coordinates, clamped radius)
    pub async fn put(
        &self,
        user_id: &str,
        lat: f64,
        lng: f64,
        radius_hint: Option<f64>,
    ) -> Result<LocationRecord, ProximityError> {
        let point = sanitize_coordinates(lat, lng)?;
        let radius_m = clamp_radius(radius_hint);
        let key = StorageKey::location(user_id);

        let lock = self.identity_lock(user_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.write_record(&key, user_id, point, radius_m).await
        };
        drop(lock);
        self.release_identity_lock(user_id).await;

        if let Ok(record) = &result {
            tracing::debug!(
                "Stored location for {}: ({}, {}) radius {}m",
                user_id,
                record.lat,
                record.lng,
                record.radius_m
            );
        }

        result
    }

    /// Stamp and persist one record; callers hold the identity lock
    async fn write_record(
        &self,
        key: &str,
        user_id: &str,
        point: GeoPoint,
        radius_m: u32,
    ) -> Result<LocationRecord, ProximityError> {
        let record = LocationRecord {
            user_id: user_id.to_string(),
            lat: point.lat,
            lng: point.lng,
            radius_m,
            updated_at: chrono::Utc::now(),
        };
        let value = serde_json::to_string(&record).map_err(StorageError::from)?;

        with_timeout("location store write", self.timeout, self.backend.put(key, value)).await?;
        Ok(record)
    }

    /// Fetch a user's stored location
    pub async fn get(&self, user_id: &str) -> Result<LocationRecord, ProximityError> {
        let key = StorageKey::location(user_id);
        let value = with_timeout("location store read", self.timeout, self.backend.get(&key)).await?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json).map_err(StorageError::from)?),
            None => Err(ProximityError::NotFound(format!(
                "no location stored for user {}",
                user_id
            ))),
        }
    }

    /// Fetch the stored locations of several users, skipping those without one
    pub async fn get_many(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, LocationRecord>, ProximityError> {
        let keys: Vec<String> = user_ids.iter().map(|id| StorageKey::location(id)).collect();
        let values =
            with_timeout("location store read", self.timeout, self.backend.get_many(&keys)).await?;

        let mut records = HashMap::with_capacity(values.len());
        for json in values.values() {
            let record: LocationRecord = serde_json::from_str(json).map_err(StorageError::from)?;
            records.insert(record.user_id.clone(), record);
        }
        Ok(records)
    }

    async fn identity_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks.entry(user_id.to_string()).or_default().clone()
    }

    /// Forget the identity's lock once no writer holds a handle to it
    async fn release_identity_lock(&self, user_id: &str) {
        let mut locks = self.write_locks.lock().await;
        if locks.get(user_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(user_id);
        }
    }
}
