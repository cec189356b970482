use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{ErrorResponse, LocationQuery, SaveLocationRequest, SaveLocationResponse};
use crate::routes::{error_response, AppState};

/// Configure location routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/location", web::post().to(save_location))
        .route("/location", web::get().to(get_location));
}

/// Save location endpoint
///
/// POST /location
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "lat": 37.7749,
///   "lng": -122.4194,
///   "radius_m": 1000
/// }
/// ```
async fn save_location(
    state: web::Data<AppState>,
    req: web::Json<SaveLocationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let (lat, lng) = match req.coordinates() {
        Ok(coords) => coords,
        Err(e) => {
            tracing::info!("Rejected location for {:?}: {}", req.user_id, e);
            return error_response(&e);
        }
    };

    match state.locations.put(&req.user_id, lat, lng, req.radius_hint()).await {
        Ok(record) => {
            tracing::info!(
                "Saved location for {} (radius {}m)",
                record.user_id,
                record.radius_m
            );
            HttpResponse::Ok().json(SaveLocationResponse::from(&record))
        }
        Err(e) => {
            if e.is_retryable() {
                tracing::error!("Failed to save location for {}: {}", req.user_id, e);
            }
            error_response(&e)
        }
    }
}

/// Get a stored location
///
/// GET /location?userId={userId}
async fn get_location(
    state: web::Data<AppState>,
    query: web::Query<LocationQuery>,
) -> impl Responder {
    let user_id = match query.user_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "User ID required".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.locations.get(user_id).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(e) => {
            if e.is_retryable() {
                tracing::error!("Failed to fetch location for {}: {}", user_id, e);
            }
            error_response(&e)
        }
    }
}
