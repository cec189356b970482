use serde::{Deserialize, Serialize};

/// A point on the globe in signed degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to another point in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        crate::core::distance::haversine_distance(*self, *other)
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Stored, privacy-rounded location of a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub radius_m: u32,
    #[serde(rename = "updatedAt")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl LocationRecord {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Entry from the user directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub profession: String,
    /// Directory position; `None` until the user shares one
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// Candidate annotated with its distance from the query origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyResult {
    pub id: String,
    pub name: String,
    pub image: String,
    pub profession: String,
    pub distance_m: f64,
}

impl NearbyResult {
    pub fn from_candidate(candidate: CandidateUser, distance_m: f64) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            image: candidate.image,
            profession: candidate.profession,
            distance_m,
        }
    }
}

/// Geospatial bounding box in degrees
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// How the query origin decides that a coordinate was not supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCoordinatePolicy {
    /// Zero, absent and non-finite values all count as missing.
    /// Rejects origins on the equator or the prime meridian.
    #[default]
    ZeroIsMissing,
    /// Only absent or non-finite values count as missing.
    ExplicitPresence,
}

/// Parameters of a nearby search
#[derive(Debug, Clone, Default)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_m: Option<f64>,
    pub limit: Option<usize>,
    pub exclude_id: Option<String>,
}

impl NearbyQuery {
    pub fn around(origin: GeoPoint) -> Self {
        Self {
            lat: Some(origin.lat),
            lng: Some(origin.lng),
            ..Self::default()
        }
    }

    pub fn radius(mut self, radius_m: f64) -> Self {
        self.radius_m = Some(radius_m);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }
}
