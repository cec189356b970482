use serde::{Deserialize, Serialize};

use crate::models::LocationRecord;

/// Response for `POST /location`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveLocationResponse {
    pub ok: bool,
    pub lat: f64,
    pub lng: f64,
    pub radius_m: u32,
}

impl From<&LocationRecord> for SaveLocationResponse {
    fn from(record: &LocationRecord) -> Self {
        Self {
            ok: true,
            lat: record.lat,
            lng: record.lng,
            radius_m: record.radius_m,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
