use crate::models::{BoundingBox, GeoPoint};

/// Earth's mean radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the haversine sphere
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Calculate the Haversine distance between two points in meters
///
/// Inputs are taken as given degree values: no range validation and no
/// longitude normalisation is performed.
///
/// # Arguments
/// * `a` - First point
/// * `b` - Second point
///
/// # Returns
/// Great-circle distance in meters, never negative
#[inline]
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // rounding can push h a hair outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Calculate a bounding box around a center point
///
/// Cheap superset pre-filter for backends that can filter server side.
/// The widest longitude on the radius circle is reached poleward of the
/// center, at `asin(sin(d / R) / cos(lat))`. When the circle reaches a pole
/// or covers a hemisphere the longitude span widens to the whole globe.
///
/// # Arguments
/// * `center` - Center point in degrees
/// * `radius_m` - Radius in meters
///
/// # Returns
/// BoundingBox with min/max lat/lng
pub fn calculate_bounding_box(center: GeoPoint, radius_m: f64) -> BoundingBox {
    let lat_delta = radius_m / METERS_PER_DEGREE;
    let angular = radius_m / EARTH_RADIUS_M;

    let cos_lat = center.lat.to_radians().cos().abs();
    let spread = if cos_lat > 0.0 { angular.sin() / cos_lat } else { f64::INFINITY };
    let lng_delta = if angular >= std::f64::consts::FRAC_PI_2
        || spread >= 1.0
        || center.lat.abs() + lat_delta >= 90.0
    {
        360.0
    } else {
        spread.asin().to_degrees()
    };

    BoundingBox {
        min_lat: center.lat - lat_delta,
        max_lat: center.lat + lat_delta,
        min_lng: center.lng - lng_delta,
        max_lng: center.lng + lng_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(point: GeoPoint, bbox: &BoundingBox) -> bool {
    point.lat >= bbox.min_lat
        && point.lat <= bbox.max_lat
        && point.lng >= bbox.min_lng
        && point.lng <= bbox.max_lng
}
