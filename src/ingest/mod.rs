//! MQTT ingestion: connection supervision, topic parsing and the
//! message-to-row pipeline.

mod connection;
mod pipeline;
mod topic;

pub use connection::{ConnectionState, MqttIngestService, MqttSettings};
pub use pipeline::{IngestError, IngestPipeline};
pub use topic::{parse_device_topic, TopicError};
