use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use geotrack_service::{
    api::{self, AppState},
    config::Config,
    db,
    devices::PgDeviceRegistry,
    ingest::{IngestPipeline, MqttIngestService, MqttSettings},
    locations::{LocationService, PgLocationStore},
    logs::PgLogStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent — env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load config
    let config = Config::from_env()?;

    // Connect to DB and run migrations
    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    let devices = Arc::new(PgDeviceRegistry::new(pool.clone()));
    let logs = Arc::new(PgLogStore::new(pool.clone()));
    let locations = Arc::new(LocationService::new(Arc::new(PgLocationStore::new(
        pool.clone(),
    ))));

    // MQTT ingestion shares the stores the HTTP layer uses, so both write
    // paths enforce the same referential rule.
    let pipeline = Arc::new(IngestPipeline::new(devices.clone(), logs.clone()));
    let mut mqtt = MqttIngestService::new(
        MqttSettings {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            topic: config.mqtt_topic.clone(),
            client_id: config.mqtt_client_id.clone(),
            keep_alive: Duration::from_secs(config.mqtt_keep_alive_secs),
            reconnect_interval: Duration::from_secs(config.mqtt_reconnect_interval_secs),
        },
        pipeline,
    );
    mqtt.start();

    // Start HTTP server
    let state = AppState {
        devices,
        logs,
        locations,
    };
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    mqtt.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
