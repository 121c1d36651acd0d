#![cfg(feature = "integration-tests")]

//! Ingestion pipeline tests against a real database. They need a
//! PostGIS-enabled Postgres reachable through `TEST_DATABASE_URL`.
//!
//! Run with: cargo test --features integration-tests

use std::sync::Arc;

use geotrack_service::db;
use geotrack_service::db::models::Device;
use geotrack_service::devices::{NewDevice, PgDeviceRegistry};
use geotrack_service::error::ServiceError;
use geotrack_service::ingest::IngestPipeline;
use geotrack_service::logs::{LogStore, NewDeviceLog, PgLogStore};
use uuid::Uuid;

struct Harness {
    registry: Arc<PgDeviceRegistry>,
    logs: Arc<PgLogStore>,
    pipeline: IngestPipeline,
}

async fn setup() -> Harness {
    let _ = dotenvy::dotenv();
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a PostGIS database");
    let pool = db::create_pool(&url, 5).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let registry = Arc::new(PgDeviceRegistry::new(pool.clone()));
    let logs = Arc::new(PgLogStore::new(pool));
    let pipeline = IngestPipeline::new(registry.clone(), logs.clone());
    Harness {
        registry,
        logs,
        pipeline,
    }
}

async fn register(harness: &Harness) -> Device {
    harness
        .registry
        .register(NewDevice {
            name: format!("tracker-{}", Uuid::new_v4()),
            description: None,
            metadata: None,
            lat: None,
            lon: None,
            address: None,
        })
        .await
        .unwrap()
}

fn data_topic(device_id: Uuid) -> String {
    format!("device/{device_id}/data")
}

#[tokio::test]
async fn reading_from_registered_device_lands_in_device_logs() {
    let harness = setup().await;
    let device = register(&harness).await;

    harness
        .pipeline
        .handle_message(&data_topic(device.device_id), br#"{"speed": 5}"#)
        .await;

    let logs = harness
        .logs
        .list_for_device(device.device_id, None, None, 10, 0)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].payload["speed"], 5);
}

#[tokio::test]
async fn reading_from_unregistered_device_is_dropped() {
    let harness = setup().await;
    let unknown = Uuid::new_v4();

    harness
        .pipeline
        .handle_message(&data_topic(unknown), br#"{"speed": 5}"#)
        .await;

    let logs = harness
        .logs
        .list_for_device(unknown, None, None, 10, 0)
        .await
        .unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn undecodable_payload_is_dropped() {
    let harness = setup().await;
    let device = register(&harness).await;

    harness
        .pipeline
        .handle_message(&data_topic(device.device_id), b"not json")
        .await;
    harness
        .pipeline
        .handle_message(&data_topic(device.device_id), b"[1, 2, 3]")
        .await;

    let logs = harness
        .logs
        .list_for_device(device.device_id, None, None, 10, 0)
        .await
        .unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn append_for_unknown_device_fails_without_partial_write() {
    let harness = setup().await;
    let unknown = Uuid::new_v4();

    let result = harness
        .logs
        .append(NewDeviceLog {
            device_id: unknown,
            payload: serde_json::json!({"speed": 5}),
        })
        .await;
    assert!(matches!(result, Err(ServiceError::Database(_))));

    let logs = harness
        .logs
        .list_for_device(unknown, None, None, 10, 0)
        .await
        .unwrap();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn range_query_returns_readings_oldest_first() {
    let harness = setup().await;
    let device = register(&harness).await;

    for speed in 1..=3 {
        harness
            .pipeline
            .handle_message(
                &data_topic(device.device_id),
                format!(r#"{{"speed": {speed}}}"#).as_bytes(),
            )
            .await;
    }

    let all = harness
        .logs
        .list_for_device(device.device_id, None, None, 10, 0)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));

    // Bound the window to the second reading's timestamp; the first reading
    // must fall outside.
    let from = all[1].recorded_at;
    let bounded = harness
        .logs
        .list_for_device(device.device_id, Some(from), None, 10, 0)
        .await
        .unwrap();
    assert!(bounded.len() >= 2);
    assert!(bounded.iter().all(|log| log.recorded_at >= from));
}
