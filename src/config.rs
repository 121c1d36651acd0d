use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
    /// Host of the MQTT broker devices publish to.
    pub mqtt_host: String,
    pub mqtt_port: u16,
    /// Subscription filter; the `+` wildcard stands for the device id segment.
    pub mqtt_topic: String,
    /// Base client identity; a random suffix is appended per process so
    /// concurrent instances never collide on the broker.
    pub mqtt_client_id: String,
    pub mqtt_keep_alive_secs: u64,
    /// Fixed delay between reconnect attempts while disconnected.
    pub mqtt_reconnect_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            mqtt_host: optional("MQTT_BROKER_HOST", "localhost"),
            mqtt_port: optional("MQTT_BROKER_PORT", "1883")
                .parse()
                .context("MQTT_BROKER_PORT must be a valid port number")?,
            mqtt_topic: optional("MQTT_TOPIC", "device/+/data"),
            mqtt_client_id: optional("MQTT_CLIENT_ID", "geotrack_ingest"),
            mqtt_keep_alive_secs: optional("MQTT_KEEP_ALIVE_SECS", "60")
                .parse()
                .context("MQTT_KEEP_ALIVE_SECS must be a positive integer")?,
            mqtt_reconnect_interval_secs: optional("MQTT_RECONNECT_INTERVAL_SECS", "5")
                .parse()
                .context("MQTT_RECONNECT_INTERVAL_SECS must be a positive integer")?,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
