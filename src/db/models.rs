use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered field device.
///
/// `id` is the internal row key; `device_id` is the identity devices publish
/// under. It is assigned at registration and never changes afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Device {
    pub id: i32,
    pub device_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Free-form metadata supplied at registration time.
    pub metadata: Option<serde_json::Value>,
    /// Last known position, when the device reports one.
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
}

/// One persisted reading. Rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DeviceLog {
    pub id: i32,
    pub device_id: Uuid,
    /// Reading payload, stored opaquely.
    pub payload: serde_json::Value,
    /// Server-assigned ingestion timestamp.
    pub recorded_at: DateTime<Utc>,
}

/// A named point, stored on the WGS84 ellipsoid (SRID 4326).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
