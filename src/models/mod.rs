// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{GeoPoint, LocationRecord, CandidateUser, NearbyResult, BoundingBox, MissingCoordinatePolicy, NearbyQuery};
pub use requests::{SaveLocationRequest, LocationQuery, DiscoverQuery};
pub use responses::{SaveLocationResponse, HealthResponse, ErrorResponse};
