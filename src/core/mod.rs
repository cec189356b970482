// Core algorithm exports
pub mod distance;
pub mod error;
pub mod location;
pub mod proximity;

pub use distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box};
pub use error::{ProximityError, UpstreamError};
pub use location::{LocationStore, clamp_radius, round_coordinate, sanitize_coordinates};
pub use proximity::{ProximityEngine, ProximitySettings, rank_nearby, resolve_origin};
