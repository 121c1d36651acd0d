use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::DeviceLog;
use crate::error::ServiceResult;

/// A reading about to be persisted. The caller has already confirmed the
/// device is registered.
#[derive(Debug, Clone)]
pub struct NewDeviceLog {
    pub device_id: Uuid,
    pub payload: serde_json::Value,
}

/// Append-only persistence for device readings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persists one reading inside its own transaction. On failure the
    /// transaction is rolled back in full and no partial write is
    /// observable.
    async fn append(&self, log: NewDeviceLog) -> ServiceResult<DeviceLog>;
}

#[derive(Clone)]
pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Readings for one device in ascending `recorded_at` order, optionally
    /// bounded to a time window.
    pub async fn list_for_device(
        &self,
        device_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<DeviceLog>> {
        let logs = sqlx::query_as::<_, DeviceLog>(
            "SELECT id, device_id, payload, recorded_at FROM device_logs \
             WHERE device_id = $1 \
               AND ($2::timestamptz IS NULL OR recorded_at >= $2) \
               AND ($3::timestamptz IS NULL OR recorded_at <= $3) \
             ORDER BY recorded_at ASC \
             LIMIT $4 OFFSET $5",
        )
        .bind(device_id)
        .bind(from)
        .bind(to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<DeviceLog>> {
        let logs = sqlx::query_as::<_, DeviceLog>(
            "SELECT id, device_id, payload, recorded_at FROM device_logs \
             ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn append(&self, log: NewDeviceLog) -> ServiceResult<DeviceLog> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, DeviceLog>(
            "INSERT INTO device_logs (device_id, payload) VALUES ($1, $2) \
             RETURNING id, device_id, payload, recorded_at",
        )
        .bind(log.device_id)
        .bind(&log.payload)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }
}
