use std::sync::Arc;
use std::time::Duration;

use crate::core::distance::haversine_distance;
use crate::core::error::{with_timeout, ProximityError};
use crate::core::location::LocationStore;
use crate::models::{CandidateUser, GeoPoint, MissingCoordinatePolicy, NearbyQuery, NearbyResult};
use crate::services::UserDirectory;

/// Radius searched when the query does not carry one, in meters
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 1000.0;

/// Result count returned when the query does not carry a limit
pub const DEFAULT_LIMIT: usize = 50;

/// Tunables of the nearby search
#[derive(Debug, Clone, Copy)]
pub struct ProximitySettings {
    pub default_radius_m: f64,
    pub default_limit: usize,
    /// Optional ceiling on the requested limit; `None` honours any limit
    pub max_limit: Option<usize>,
    pub missing_coordinates: MissingCoordinatePolicy,
    pub upstream_timeout: Duration,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_SEARCH_RADIUS_M,
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
            missing_coordinates: MissingCoordinatePolicy::ZeroIsMissing,
            upstream_timeout: Duration::from_secs(3),
        }
    }
}

/// Resolve the query origin according to `policy`
pub fn resolve_origin(
    lat: Option<f64>,
    lng: Option<f64>,
    policy: MissingCoordinatePolicy,
) -> Result<GeoPoint, ProximityError> {
    let present = |v: f64| match policy {
        MissingCoordinatePolicy::ZeroIsMissing => v.is_finite() && v != 0.0,
        MissingCoordinatePolicy::ExplicitPresence => v.is_finite(),
    };

    match (lat, lng) {
        (Some(lat), Some(lng)) if present(lat) && present(lng) => Ok(GeoPoint::new(lat, lng)),
        _ => Err(ProximityError::MissingCoordinates),
    }
}

/// Rank candidates by distance from `origin`
///
/// Pure ranking step of the nearby search:
/// 1. Drop the excluded identity
/// 2. Compute the haversine distance of every remaining candidate with a position
/// 3. Keep candidates with `distance_m <= radius_m`
/// 4. Stable sort ascending by distance (ties keep input order)
/// 5. Truncate to `limit`
pub fn rank_nearby(
    origin: GeoPoint,
    candidates: Vec<CandidateUser>,
    radius_m: f64,
    limit: usize,
    exclude_id: Option<&str>,
) -> Vec<NearbyResult> {
    let mut nearby: Vec<NearbyResult> = candidates
        .into_iter()
        .filter(|c| exclude_id != Some(c.id.as_str()))
        .filter_map(|c| {
            let distance_m = haversine_distance(origin, c.location?);
            (distance_m <= radius_m).then(|| NearbyResult::from_candidate(c, distance_m))
        })
        .collect();

    // sort_by is stable; NaN distances never pass the radius filter
    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    nearby.truncate(limit);

    nearby
}

/// Answers "who is near this point"
///
/// Pulls candidates from the user directory, replaces a candidate's
/// directory position with the location they shared through the
/// `LocationStore` when one exists, then ranks them with `rank_nearby`.
#[derive(Clone)]
pub struct ProximityEngine {
    directory: Arc<dyn UserDirectory>,
    locations: Option<Arc<LocationStore>>,
    settings: ProximitySettings,
}

impl ProximityEngine {
    pub fn new(directory: Arc<dyn UserDirectory>, settings: ProximitySettings) -> Self {
        Self {
            directory,
            locations: None,
            settings,
        }
    }

    /// Prefer positions users shared themselves over directory positions
    pub fn with_location_store(mut self, locations: Arc<LocationStore>) -> Self {
        self.locations = Some(locations);
        self
    }

    pub fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    /// Find users near the query origin
    ///
    /// # Returns
    /// Ordered nearby users; an empty list when nobody qualifies
    pub async fn find_nearby(&self, query: &NearbyQuery) -> Result<Vec<NearbyResult>, ProximityError> {
        let origin = resolve_origin(query.lat, query.lng, self.settings.missing_coordinates)?;
        let radius_m = query
            .radius_m
            .filter(|r| r.is_finite())
            .unwrap_or(self.settings.default_radius_m);
        let requested = query.limit.unwrap_or(self.settings.default_limit);
        let limit = match self.settings.max_limit {
            Some(max) => requested.min(max),
            None => requested,
        };

        // positional pre-filter only without the shared-location overlay
        let fetch = async {
            if self.locations.is_some() {
                self.directory.candidates().await
            } else {
                self.directory.candidates_near(origin, radius_m).await
            }
        };
        let mut candidates =
            with_timeout("directory fetch", self.settings.upstream_timeout, fetch).await?;
        let total_candidates = candidates.len();

        if let Some(locations) = &self.locations {
            self.apply_shared_locations(locations, &mut candidates).await?;
        }

        let nearby = rank_nearby(origin, candidates, radius_m, limit, query.exclude_id.as_deref());

        tracing::debug!(
            "Nearby search radius {}m limit {}: {} of {} candidates",
            radius_m,
            limit,
            nearby.len(),
            total_candidates
        );

        Ok(nearby)
    }

    async fn apply_shared_locations(
        &self,
        locations: &LocationStore,
        candidates: &mut [CandidateUser],
    ) -> Result<(), ProximityError> {
        if candidates.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let shared = locations.get_many(&ids).await?;

        for candidate in candidates.iter_mut() {
            if let Some(record) = shared.get(&candidate.id) {
                candidate.location = Some(record.point());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::EARTH_RADIUS_M;
    use crate::services::{MemoryDirectory, MemoryStore};

    const ORIGIN: GeoPoint = GeoPoint { lat: 37.7749, lng: -122.4194 };

    /// Candidate due north of ORIGIN at `meters`
    fn candidate_at(id: &str, meters: f64) -> CandidateUser {
        let degrees = (meters / EARTH_RADIUS_M).to_degrees();
        CandidateUser {
            id: id.to_string(),
            name: format!("User {}", id),
            image: format!("{}.jpg", id),
            profession: "Tester".to_string(),
            location: Some(GeoPoint::new(ORIGIN.lat + degrees, ORIGIN.lng)),
        }
    }

    fn engine(candidates: Vec<CandidateUser>) -> ProximityEngine {
        ProximityEngine::new(Arc::new(MemoryDirectory::new(candidates)), ProximitySettings::default())
    }

    fn ids(results: &[NearbyResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_rank_filters_and_sorts() {
        let candidates = vec![
            candidate_at("a", 50.0),
            candidate_at("b", 1200.0),
            candidate_at("c", 300.0),
            candidate_at("d", 2500.0),
        ];

        let results = rank_nearby(ORIGIN, candidates, 1000.0, 10, None);

        assert_eq!(ids(&results), vec!["a", "c"]);
        assert!((results[0].distance_m - 50.0).abs() < 0.01);
        assert!((results[1].distance_m - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_rank_excludes_even_closest() {
        let candidates = vec![candidate_at("me", 0.0), candidate_at("other", 400.0)];

        let results = rank_nearby(ORIGIN, candidates, 1000.0, 10, Some("me"));

        assert_eq!(ids(&results), vec!["other"]);
    }

    #[test]
    fn test_rank_limit() {
        let candidates = vec![candidate_at("far", 60.0), candidate_at("near", 50.0)];

        let results = rank_nearby(ORIGIN, candidates, 1000.0, 1, None);

        assert_eq!(ids(&results), vec!["near"]);
    }

    #[test]
    fn test_rank_boundary_is_inclusive() {
        let candidates = vec![candidate_at("here", 0.0)];

        let results = rank_nearby(ORIGIN, candidates, 0.0, 10, None);

        assert_eq!(ids(&results), vec!["here"]);
        assert_eq!(results[0].distance_m, 0.0);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let candidates = vec![
            candidate_at("x", 200.0),
            candidate_at("first", 100.0),
            candidate_at("second", 100.0),
            candidate_at("third", 100.0),
        ];

        let results = rank_nearby(ORIGIN, candidates, 1000.0, 10, None);

        assert_eq!(ids(&results), vec!["first", "second", "third", "x"]);
    }

    #[test]
    fn test_rank_skips_non_finite_locations() {
        let mut broken = candidate_at("broken", 10.0);
        broken.location = Some(GeoPoint::new(f64::NAN, ORIGIN.lng));

        let results = rank_nearby(ORIGIN, vec![broken, candidate_at("ok", 10.0)], 1000.0, 10, None);

        assert_eq!(ids(&results), vec!["ok"]);
    }

    #[test]
    fn test_rank_skips_candidates_without_position() {
        let mut unplaced = candidate_at("unplaced", 10.0);
        unplaced.location = None;

        let results = rank_nearby(ORIGIN, vec![unplaced, candidate_at("ok", 10.0)], 1000.0, 10, None);

        assert_eq!(ids(&results), vec!["ok"]);
    }

    #[test]
    fn test_resolve_origin_policies() {
        let zero = MissingCoordinatePolicy::ZeroIsMissing;
        let explicit = MissingCoordinatePolicy::ExplicitPresence;

        assert!(resolve_origin(Some(1.0), Some(2.0), zero).is_ok());
        assert!(matches!(resolve_origin(None, Some(2.0), zero), Err(ProximityError::MissingCoordinates)));
        assert!(matches!(resolve_origin(Some(0.0), Some(2.0), zero), Err(ProximityError::MissingCoordinates)));
        assert!(matches!(resolve_origin(Some(1.0), Some(f64::NAN), zero), Err(ProximityError::MissingCoordinates)));

        assert_eq!(resolve_origin(Some(0.0), Some(0.0), explicit).unwrap(), GeoPoint::new(0.0, 0.0));
        assert!(resolve_origin(Some(1.0), None, explicit).is_err());
    }

    #[tokio::test]
    async fn test_find_nearby_defaults() {
        // 1000 m default radius: 999 m is in, 1001 m is out
        let engine = engine(vec![candidate_at("in", 999.0), candidate_at("out", 1001.0)]);

        let results = engine.find_nearby(&NearbyQuery::around(ORIGIN)).await.unwrap();

        assert_eq!(ids(&results), vec!["in"]);
    }

    #[tokio::test]
    async fn test_find_nearby_default_limit_is_fifty() {
        let candidates = (0..80).map(|i| candidate_at(&i.to_string(), i as f64)).collect();
        let engine = engine(candidates);

        let results = engine.find_nearby(&NearbyQuery::around(ORIGIN)).await.unwrap();

        assert_eq!(results.len(), 50);
        assert_eq!(results[0].id, "0");
    }

    #[tokio::test]
    async fn test_find_nearby_honours_large_limit() {
        let candidates = (0..150).map(|i| candidate_at(&i.to_string(), i as f64)).collect();
        let engine = engine(candidates);

        let results = engine
            .find_nearby(&NearbyQuery::around(ORIGIN).limit(150))
            .await
            .unwrap();

        assert_eq!(results.len(), 150);
    }

    #[tokio::test]
    async fn test_find_nearby_configured_cap() {
        let candidates = (0..150).map(|i| candidate_at(&i.to_string(), i as f64)).collect();
        let settings = ProximitySettings {
            max_limit: Some(100),
            ..ProximitySettings::default()
        };
        let engine = ProximityEngine::new(Arc::new(MemoryDirectory::new(candidates)), settings);

        let results = engine
            .find_nearby(&NearbyQuery::around(ORIGIN).limit(1000))
            .await
            .unwrap();

        assert_eq!(results.len(), 100);
    }

    #[tokio::test]
    async fn test_find_nearby_non_finite_radius_uses_default() {
        let engine = engine(vec![candidate_at("in", 900.0)]);

        let results = engine
            .find_nearby(&NearbyQuery::around(ORIGIN).radius(f64::NAN))
            .await
            .unwrap();

        assert_eq!(ids(&results), vec!["in"]);
    }

    #[tokio::test]
    async fn test_find_nearby_empty_is_ok() {
        let engine = engine(vec![candidate_at("far", 5000.0)]);

        let results = engine.find_nearby(&NearbyQuery::around(ORIGIN)).await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_find_nearby_missing_origin() {
        let engine = engine(vec![]);

        let result = engine.find_nearby(&NearbyQuery::default()).await;

        assert!(matches!(result, Err(ProximityError::MissingCoordinates)));
    }

    #[tokio::test]
    async fn test_shared_location_overrides_directory_position() {
        let store = Arc::new(LocationStore::new(Arc::new(MemoryStore::new())));
        // directory places "mover" 5 km away, but they shared a spot near the origin
        store
            .put("mover", ORIGIN.lat + 0.001, ORIGIN.lng, None)
            .await
            .unwrap();

        let engine = engine(vec![candidate_at("stay", 500.0), candidate_at("mover", 5000.0)])
            .with_location_store(store);

        let results = engine.find_nearby(&NearbyQuery::around(ORIGIN)).await.unwrap();

        assert_eq!(ids(&results), vec!["mover", "stay"]);
        assert!(results[0].distance_m < 120.0);
    }

    #[tokio::test]
    async fn test_find_nearby_is_repeatable() {
        let engine = engine(vec![
            candidate_at("a", 100.0),
            candidate_at("b", 100.0),
            candidate_at("c", 20.0),
        ]);
        let query = NearbyQuery::around(ORIGIN).excluding("z");

        let first = engine.find_nearby(&query).await.unwrap();
        let second = engine.find_nearby(&query).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["c", "a", "b"]);
    }
}
