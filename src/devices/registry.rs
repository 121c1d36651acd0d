use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::db::models::Device;
use crate::error::{ServiceError, ServiceResult};

/// Read-side device resolution used by the ingestion path.
///
/// The pipeline only ever needs to answer "is this identifier registered";
/// keeping that behind a trait lets message-handling tests run without a
/// database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceLookup: Send + Sync {
    /// Resolve a published device identifier to a registered device.
    async fn find_by_device_id(&self, device_id: Uuid) -> ServiceResult<Option<Device>>;
}

/// Fields accepted when registering or updating a device. The published
/// identifier is never part of this: it is assigned once at registration.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub name: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
}

/// Postgres-backed registry of known devices.
#[derive(Clone)]
pub struct PgDeviceRegistry {
    pool: PgPool,
}

impl PgDeviceRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a device under a freshly assigned identifier.
    pub async fn register(&self, input: NewDevice) -> ServiceResult<Device> {
        let device = sqlx::query_as::<_, Device>(
            "INSERT INTO devices (device_id, name, description, metadata, lat, lon, address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, device_id, name, description, metadata, lat, lon, address",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.metadata)
        .bind(input.lat)
        .bind(input.lon)
        .bind(&input.address)
        .fetch_one(&self.pool)
        .await?;

        debug!(device_id = %device.device_id, name = %device.name, "device registered");
        Ok(device)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(
            "SELECT id, device_id, name, description, metadata, lat, lon, address \
             FROM devices ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Device> {
        sqlx::query_as::<_, Device>(
            "SELECT id, device_id, name, description, metadata, lat, lon, address \
             FROM devices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::DeviceNotFound(id))
    }

    /// Updates the mutable fields of a device. `device_id` is immutable and
    /// deliberately absent from the statement.
    pub async fn update(&self, id: i32, input: NewDevice) -> ServiceResult<Device> {
        sqlx::query_as::<_, Device>(
            "UPDATE devices \
             SET name = $2, description = $3, metadata = $4, lat = $5, lon = $6, address = $7 \
             WHERE id = $1 \
             RETURNING id, device_id, name, description, metadata, lat, lon, address",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.metadata)
        .bind(input.lat)
        .bind(input.lon)
        .bind(&input.address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::DeviceNotFound(id))
    }

    pub async fn delete(&self, id: i32) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::DeviceNotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceLookup for PgDeviceRegistry {
    async fn find_by_device_id(&self, device_id: Uuid) -> ServiceResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(
            "SELECT id, device_id, name, description, metadata, lat, lon, address \
             FROM devices WHERE device_id = $1",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }
}
