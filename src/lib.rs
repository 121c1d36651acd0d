//! Device telemetry ingestion over MQTT plus geospatial location queries,
//! backed by Postgres/PostGIS.

pub mod api;
pub mod config;
pub mod db;
pub mod devices;
pub mod error;
pub mod ingest;
pub mod locations;
pub mod logs;
