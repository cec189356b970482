use actix_web::{web, HttpResponse, Responder};

use crate::models::DiscoverQuery;
use crate::routes::{error_response, AppState};

/// Configure discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/discover", web::get().to(discover));
}

/// Discover nearby users
///
/// GET /discover?lat={lat}&lng={lng}&radius={meters}&limit={n}&me={userId}
///
/// Responds with an array of `{ id, name, image, profession, distance_m }`
/// sorted by ascending distance.
async fn discover(
    state: web::Data<AppState>,
    query: web::Query<DiscoverQuery>,
) -> impl Responder {
    let query = query.into_inner().into_nearby_query();

    match state.engine.find_nearby(&query).await {
        Ok(nearby) => {
            tracing::info!(
                "Returning {} nearby users (exclude: {:?})",
                nearby.len(),
                query.exclude_id
            );
            HttpResponse::Ok().json(nearby)
        }
        Err(e) => {
            if e.is_retryable() {
                tracing::error!("Discover failed: {}", e);
            }
            error_response(&e)
        }
    }
}
