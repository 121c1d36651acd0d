use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::devices::NewDevice;
use crate::locations::LocationInput;

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeviceWriteRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form metadata object.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<DeviceWriteRequest> for NewDevice {
    fn from(r: DeviceWriteRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            metadata: r.metadata.map(serde_json::Value::Object),
            lat: r.lat,
            lon: r.lon,
            address: r.address,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceDto {
    pub id: i32,
    pub device_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Option<serde_json::Value>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
}

impl From<crate::db::models::Device> for DeviceDto {
    fn from(d: crate::db::models::Device) -> Self {
        Self {
            id: d.id,
            device_id: d.device_id,
            name: d.name,
            description: d.description,
            metadata: d.metadata,
            lat: d.lat,
            lon: d.lon,
            address: d.address,
        }
    }
}

// ---------------------------------------------------------------------------
// Device logs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeviceLogCreateRequest {
    /// Identifier the device publishes under; must already be registered.
    pub device_id: Uuid,
    #[schema(value_type = Object)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceLogDto {
    pub id: i32,
    pub device_id: Uuid,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl From<crate::db::models::DeviceLog> for DeviceLogDto {
    fn from(l: crate::db::models::DeviceLog) -> Self {
        Self {
            id: l.id,
            device_id: l.device_id,
            payload: l.payload,
            recorded_at: l.recorded_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationWriteRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// WGS84 degrees, [-90, 90].
    pub latitude: f64,
    /// WGS84 degrees, [-180, 180].
    pub longitude: f64,
}

impl From<LocationWriteRequest> for LocationInput {
    fn from(r: LocationWriteRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationDto {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<crate::db::models::Location> for LocationDto {
    fn from(l: crate::db::models::Location) -> Self {
        Self {
            id: l.id,
            name: l.name,
            description: l.description,
            latitude: l.latitude,
            longitude: l.longitude,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

/// Body for `POST /locations/nearby`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NearbyRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in meters, (0, 100000].
    pub radius: f64,
}
