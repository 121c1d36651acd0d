#![cfg(feature = "integration-tests")]

//! HTTP round-trips over a real database. They need a PostGIS-enabled
//! Postgres reachable through `TEST_DATABASE_URL`.
//!
//! Run with: cargo test --features integration-tests

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use geotrack_service::api::{router, AppState};
use geotrack_service::db;
use geotrack_service::devices::PgDeviceRegistry;
use geotrack_service::locations::{LocationService, PgLocationStore};
use geotrack_service::logs::PgLogStore;
use serde_json::{json, Value};
use uuid::Uuid;

async fn setup() -> TestServer {
    let _ = dotenvy::dotenv();
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a PostGIS database");
    let pool = db::create_pool(&url, 5).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let state = AppState {
        devices: Arc::new(PgDeviceRegistry::new(pool.clone())),
        logs: Arc::new(PgLogStore::new(pool.clone())),
        locations: Arc::new(LocationService::new(Arc::new(PgLocationStore::new(pool)))),
    };
    TestServer::new(router(state)).unwrap()
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[tokio::test]
async fn device_crud_round_trip() {
    let server = setup().await;
    let name = unique_name("tracker");

    let created = server
        .post("/devices")
        .json(&json!({ "name": name, "description": "van tracker" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let device = created.json::<Value>();
    let id = device["id"].as_i64().unwrap();
    let device_id = device["device_id"].as_str().unwrap().to_owned();

    let fetched = server.get(&format!("/devices/{id}")).await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["name"], name.as_str());

    // The published identifier survives updates untouched.
    let updated = server
        .put(&format!("/devices/{id}"))
        .json(&json!({ "name": unique_name("renamed"), "lat": 37.0, "lon": -122.0 }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["device_id"], device_id.as_str());

    let deleted = server.delete(&format!("/devices/{id}")).await;
    deleted.assert_status(StatusCode::NO_CONTENT);

    let missing = server.get(&format!("/devices/{id}")).await;
    missing.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn direct_log_write_requires_registered_device() {
    let server = setup().await;

    let rejected = server
        .post("/device-logs")
        .json(&json!({ "device_id": Uuid::new_v4(), "payload": { "speed": 5 } }))
        .await;
    rejected.assert_status(StatusCode::NOT_FOUND);

    let created = server
        .post("/devices")
        .json(&json!({ "name": unique_name("tracker") }))
        .await;
    let device_id = created.json::<Value>()["device_id"]
        .as_str()
        .unwrap()
        .to_owned();

    let accepted = server
        .post("/device-logs")
        .json(&json!({ "device_id": device_id, "payload": { "speed": 5 } }))
        .await;
    accepted.assert_status(StatusCode::CREATED);

    let listed = server.get(&format!("/devices/{device_id}/logs")).await;
    listed.assert_status_ok();
    let logs = listed.json::<Value>();
    assert_eq!(logs.as_array().unwrap().len(), 1);
    assert_eq!(logs[0]["payload"]["speed"], 5);
}

#[tokio::test]
async fn nearby_query_separates_near_from_far() {
    let server = setup().await;

    let near = server
        .post("/locations")
        .json(&json!({ "name": unique_name("near"), "latitude": 37.0, "longitude": -122.0 }))
        .await;
    near.assert_status(StatusCode::CREATED);
    let near_id = near.json::<Value>()["id"].as_i64().unwrap();

    let far = server
        .post("/locations")
        .json(&json!({ "name": unique_name("far"), "latitude": 37.45, "longitude": -122.0 }))
        .await;
    far.assert_status(StatusCode::CREATED);
    let far_id = far.json::<Value>()["id"].as_i64().unwrap();

    let tight = server
        .post("/locations/nearby")
        .json(&json!({ "latitude": 37.0, "longitude": -122.0, "radius": 10.0 }))
        .await;
    tight.assert_status_ok();
    let ids: Vec<i64> = tight
        .json::<Value>()
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&near_id));
    assert!(!ids.contains(&far_id));

    // At the maximum radius both points fall inside, even with the Mercator
    // scale distortion at this latitude.
    let wide = server
        .post("/locations/nearby")
        .json(&json!({ "latitude": 37.0, "longitude": -122.0, "radius": 100000.0 }))
        .await;
    wide.assert_status_ok();
    let ids: Vec<i64> = wide
        .json::<Value>()
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&near_id));
    assert!(ids.contains(&far_id));
}
