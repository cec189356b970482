//! Nearby Discovery - proximity service for finding people nearby
//!
//! Users share a privacy-rounded location and browse the other users within
//! a radius. The crate provides the distance math, the location store and
//! the ranked nearby search, plus the HTTP surface around them.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use crate::core::{LocationStore, ProximityEngine, ProximityError, ProximitySettings, haversine_distance};
pub use models::{GeoPoint, LocationRecord, CandidateUser, NearbyResult, NearbyQuery};
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let p = GeoPoint::new(40.7128, -74.0060);
        assert_eq!(haversine_distance(p, p), 0.0);
    }
}
