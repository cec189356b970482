// HTTP tests for Nearby Discovery

use actix_web::{test, web, App};
use nearby_discovery::core::{LocationStore, ProximityEngine, ProximitySettings};
use nearby_discovery::routes;
use nearby_discovery::services::{MemoryDirectory, MemoryStore};
use nearby_discovery::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;

fn app_state() -> AppState {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/users.json");
    let directory = MemoryDirectory::from_file(path).expect("seed users");

    let locations = Arc::new(LocationStore::new(Arc::new(MemoryStore::new())));
    let engine = ProximityEngine::new(Arc::new(directory), ProximitySettings::default())
        .with_location_store(locations.clone());

    AppState::new(locations, engine)
}

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(app_state()))
                .app_data(routes::json_config())
                .app_data(routes::query_config())
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_save_location_rounds_and_clamps() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/location")
        .set_json(json!({ "userId": "u1", "lat": 37.774912345, "lng": -122.419412345, "radius_m": 5000 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "ok": true, "lat": 37.77491, "lng": -122.41941, "radius_m": 2000 }));
}

#[actix_web::test]
async fn test_save_location_rejects_non_numeric() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/location")
        .set_json(json!({ "userId": "u1", "lat": "x", "lng": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status_code"], 400);
    assert_eq!(body["error"], "Invalid coordinates");
}

#[actix_web::test]
async fn test_save_location_requires_user_id() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/location")
        .set_json(json!({ "lat": 37.0, "lng": -122.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_missing_user_id_reported_before_bad_coordinates() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/location")
        .set_json(json!({ "lat": "x", "lng": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/location")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_get_location_flow() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/location").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::get().uri("/location?userId=ghost").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::post()
        .uri("/location")
        .set_json(json!({ "userId": "u1", "lat": 37.0, "lng": -122.0, "radius_m": 100 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get().uri("/location?userId=u1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["lat"], 37.0);
    assert_eq!(body["lng"], -122.0);
    assert_eq!(body["radius_m"], 500);
    assert!(body["updatedAt"].is_string());
}

#[actix_web::test]
async fn test_discover_returns_sorted_nearby_users() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/discover?lat=37.7749&lng=-122.4194&radius=1500&me=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Vec<Value> = test::read_body_json(resp).await;
    let ids: Vec<&str> = body.iter().map(|u| u["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["5", "4", "2", "3"]);

    let first = &body[0];
    assert_eq!(first["name"], "Eva Brown");
    assert_eq!(first["profession"], "Marketing");
    assert!(first["image"].is_string());
    assert!(first["distance_m"].as_f64().unwrap() < 1000.0);
}

#[actix_web::test]
async fn test_discover_defaults_and_limit() {
    let app = test_app!();

    // default radius 1000: only Alice (0 m) and Eva (879 m)
    let req = test::TestRequest::get()
        .uri("/discover?lat=37.7749&lng=-122.4194&radius=abc")
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.len(), 2);
    assert_eq!(body[0]["id"], "1");

    let req = test::TestRequest::get()
        .uri("/discover?lat=37.7749&lng=-122.4194&limit=1")
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.len(), 1);
}

#[actix_web::test]
async fn test_discover_empty_is_ok() {
    let app = test_app!();

    let req = test::TestRequest::get()
        .uri("/discover?lat=51.5074&lng=-0.1278")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Vec<Value> = test::read_body_json(resp).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn test_discover_missing_or_zero_coordinates() {
    let app = test_app!();

    for uri in [
        "/discover",
        "/discover?lat=37.7749",
        "/discover?lat=0&lng=-122.4194",
        "/discover?lat=37.7749&lng=nope",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400, "{}", uri);
    }
}

#[actix_web::test]
async fn test_shared_location_moves_user_in_discover() {
    let app = test_app!();

    // Carol (id 3) shares a spot right next to the caller
    let req = test::TestRequest::post()
        .uri("/location")
        .set_json(json!({ "userId": "3", "lat": 37.7750, "lng": -122.4194 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri("/discover?lat=37.7749&lng=-122.4194&me=1")
        .to_request();
    let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["id"], "3");
}

#[actix_web::test]
async fn test_health() {
    let app = test_app!();

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
