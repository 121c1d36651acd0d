use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::models::DeviceLog;
use crate::devices::DeviceLookup;
use crate::error::ServiceError;
use crate::logs::{LogStore, NewDeviceLog};

use super::topic::{parse_device_topic, TopicError};

/// Why an inbound message was not persisted.
///
/// Every variant is terminal for the message: handling is at-most-once, the
/// message is dropped, and nothing propagates to the connection manager.
/// The classification only decides which log line gets written.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Topic(#[from] TopicError),

    #[error("payload is not valid JSON: {0}")]
    PayloadDecode(#[source] serde_json::Error),

    #[error("payload is valid JSON but not a key-value object")]
    PayloadShape,

    #[error("device {0} is not registered")]
    UnknownDevice(Uuid),

    #[error(transparent)]
    Persistence(#[from] ServiceError),
}

/// Turns one delivered MQTT message into one `device_logs` row.
///
/// The pipeline holds no connection state; the connection manager hands it
/// raw topic/payload pairs and forgets about them.
pub struct IngestPipeline {
    devices: Arc<dyn DeviceLookup>,
    logs: Arc<dyn LogStore>,
}

impl IngestPipeline {
    pub fn new(devices: Arc<dyn DeviceLookup>, logs: Arc<dyn LogStore>) -> Self {
        Self { devices, logs }
    }

    /// Handles one message end to end. Never returns an error: each failure
    /// is classified, logged and swallowed here so a malformed or unknown
    /// reading can only ever cost its own message.
    pub async fn handle_message(&self, topic: &str, payload: &[u8]) {
        match self.process(topic, payload).await {
            Ok(log) => {
                info!(device_id = %log.device_id, log_id = log.id, "reading persisted");
            }
            Err(e @ IngestError::Topic(_)) => {
                warn!(topic = %topic, error = %e, "discarding message with unusable topic");
            }
            Err(e @ IngestError::PayloadDecode(_)) => {
                warn!(topic = %topic, error = %e, "discarding message with undecodable payload");
            }
            Err(e @ IngestError::PayloadShape) => {
                warn!(topic = %topic, error = %e, "discarding message with non-object payload");
            }
            Err(IngestError::UnknownDevice(device_id)) => {
                warn!(device_id = %device_id, "discarding reading from unregistered device");
            }
            Err(IngestError::Persistence(e)) => {
                error!(topic = %topic, error = %e, "failed to persist reading, unit of work rolled back");
            }
        }
    }

    async fn process(&self, topic: &str, payload: &[u8]) -> Result<DeviceLog, IngestError> {
        let device_id = parse_device_topic(topic)?;

        let value: serde_json::Value =
            serde_json::from_slice(payload).map_err(IngestError::PayloadDecode)?;
        if !value.is_object() {
            return Err(IngestError::PayloadShape);
        }

        debug!(
            device_id = %device_id,
            payload_size = payload.len(),
            "decoded reading"
        );

        let device = self
            .devices
            .find_by_device_id(device_id)
            .await?
            .ok_or(IngestError::UnknownDevice(device_id))?;

        let log = self
            .logs
            .append(NewDeviceLog {
                device_id: device.device_id,
                payload: value,
            })
            .await?;
        Ok(log)
    }
}
