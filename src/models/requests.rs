use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::core::ProximityError;
use crate::models::NearbyQuery;

/// Request to share the caller's location
///
/// Coordinates are kept as raw JSON so that a string or null can be
/// rejected as an invalid coordinate instead of a generic payload error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SaveLocationRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: String,
    #[serde(default)]
    pub lat: Value,
    #[serde(default)]
    pub lng: Value,
    #[serde(default)]
    pub radius_m: Value,
}

impl SaveLocationRequest {
    /// Extract numeric coordinates, failing when either is not a JSON number
    pub fn coordinates(&self) -> Result<(f64, f64), ProximityError> {
        let lat = self
            .lat
            .as_f64()
            .ok_or_else(|| ProximityError::InvalidCoordinate(format!("lat is not a number: {}", self.lat)))?;
        let lng = self
            .lng
            .as_f64()
            .ok_or_else(|| ProximityError::InvalidCoordinate(format!("lng is not a number: {}", self.lng)))?;
        Ok((lat, lng))
    }

    /// Radius hint, `None` unless the client sent a JSON number
    pub fn radius_hint(&self) -> Option<f64> {
        self.radius_m.as_f64()
    }
}

/// Query for `GET /location`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Query for `GET /discover`
///
/// Every field is taken as a string and parsed leniently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub limit: Option<String>,
    pub me: Option<String>,
}

impl DiscoverQuery {
    pub fn into_nearby_query(self) -> NearbyQuery {
        NearbyQuery {
            lat: parse_number(self.lat.as_deref()),
            lng: parse_number(self.lng.as_deref()),
            radius_m: parse_number(self.radius.as_deref()),
            limit: parse_number(self.limit.as_deref())
                .filter(|l| *l >= 0.0)
                .map(|l| l.floor() as usize),
            exclude_id: self.me.filter(|me| !me.is_empty()),
        }
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
