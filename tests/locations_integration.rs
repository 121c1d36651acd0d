#![cfg(feature = "integration-tests")]

//! End-to-end store tests. They need a PostGIS-enabled Postgres reachable
//! through `TEST_DATABASE_URL`, e.g.
//!
//!   docker run -d -p 5432:5432 -e POSTGRES_PASSWORD=geotrack postgis/postgis:16-3.4
//!
//! Run with: cargo test --features integration-tests

use std::sync::Arc;

use geotrack_service::db;
use geotrack_service::error::ServiceError;
use geotrack_service::locations::{LocationInput, LocationService, PgLocationStore};
use uuid::Uuid;

async fn setup() -> LocationService {
    let _ = dotenvy::dotenv();
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a PostGIS database");
    let pool = db::create_pool(&url, 5).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    LocationService::new(Arc::new(PgLocationStore::new(pool)))
}

fn input(name: &str, latitude: f64, longitude: f64) -> LocationInput {
    LocationInput {
        name: name.to_owned(),
        description: None,
        latitude,
        longitude,
    }
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[tokio::test]
async fn round_trip_preserves_coordinates() {
    let service = setup().await;

    let created = service
        .create(input(&unique_name("depot"), 37.7793, -122.4193))
        .await
        .unwrap();
    let fetched = service.get(created.id).await.unwrap();

    assert!((fetched.latitude - 37.7793).abs() < 1e-9);
    assert!((fetched.longitude + 122.4193).abs() < 1e-9);
    assert!(fetched.updated_at.is_none());
}

#[tokio::test]
async fn repeated_update_leaves_geometry_unchanged() {
    let service = setup().await;

    let created = service
        .create(input(&unique_name("depot"), 10.0, 20.0))
        .await
        .unwrap();

    let replacement = input(&unique_name("depot-moved"), 11.0, 21.0);
    let first = service.update(created.id, replacement.clone()).await.unwrap();
    let second = service.update(created.id, replacement).await.unwrap();

    assert_eq!(first.latitude, second.latitude);
    assert_eq!(first.longitude, second.longitude);
    assert_eq!(first.name, second.name);
    assert!(second.updated_at.is_some());
}

#[tokio::test]
async fn delete_then_get_reports_not_found() {
    let service = setup().await;

    let created = service
        .create(input(&unique_name("depot"), 0.0, 0.0))
        .await
        .unwrap();
    service.delete(created.id).await.unwrap();

    let missing = service.get(created.id).await;
    assert!(matches!(missing, Err(ServiceError::LocationNotFound(_))));

    let again = service.delete(created.id).await;
    assert!(matches!(again, Err(ServiceError::LocationNotFound(_))));
}

#[tokio::test]
async fn nearby_includes_colocated_point_and_excludes_distant_one() {
    let service = setup().await;

    let near = service
        .create(input(&unique_name("near"), 37.0, -122.0))
        .await
        .unwrap();
    // Roughly 50 km north of the query point.
    let far = service
        .create(input(&unique_name("far"), 37.45, -122.0))
        .await
        .unwrap();

    let found = service.find_nearby(37.0, -122.0, 10.0).await.unwrap();
    let ids: Vec<i32> = found.iter().map(|l| l.id).collect();

    assert!(ids.contains(&near.id));
    assert!(!ids.contains(&far.id));
}

#[tokio::test]
async fn nearby_with_large_radius_reaches_neighbouring_points() {
    let service = setup().await;

    let neighbour = service
        .create(input(&unique_name("neighbour"), 37.05, -122.0))
        .await
        .unwrap();

    // ~5.5 km away on the ground, comfortably inside 10 km even after the
    // Mercator scale distortion at this latitude.
    let found = service.find_nearby(37.0, -122.0, 10_000.0).await.unwrap();
    let ids: Vec<i32> = found.iter().map(|l| l.id).collect();

    assert!(ids.contains(&neighbour.id));
}
