// Route exports
pub mod discover;
pub mod location;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, Responder};

use crate::core::ProximityError;
use crate::models::{ErrorResponse, HealthResponse};

pub use crate::state::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .configure(location::configure)
        .configure(discover::configure);
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.locations.backend().health_check().await.unwrap_or(false);
    let directory_healthy = state.engine.directory().health_check().await.unwrap_or(false);

    let status = if store_healthy && directory_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// JSON error for malformed payloads and query strings
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(handle_json_payload_error)
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(handle_query_payload_error)
}

/// Map a core error onto its HTTP response
pub(crate) fn error_response(err: &ProximityError) -> HttpResponse {
    let (status, error) = match err {
        ProximityError::InvalidCoordinate(_) => (StatusCode::BAD_REQUEST, "Invalid coordinates"),
        ProximityError::MissingCoordinates => (StatusCode::BAD_REQUEST, "lat,lng required"),
        ProximityError::NotFound(_) => (StatusCode::NOT_FOUND, "Location not found"),
        ProximityError::UpstreamFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Upstream failure"),
    };

    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}
