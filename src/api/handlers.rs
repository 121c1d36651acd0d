use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::OpenApi;
use uuid::Uuid;

use super::{
    dto::{
        DeviceDto, DeviceLogCreateRequest, DeviceLogDto, DeviceWriteRequest, LocationDto,
        LocationWriteRequest, NearbyRequest,
    },
    errors::ApiError,
    AppState,
};
use crate::devices::DeviceLookup;
use crate::error::ServiceError;
use crate::logs::{LogStore, NewDeviceLog};

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 1000)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Deserialize)]
pub struct LogRangeParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// Register a device. The published identifier is assigned here and returned
/// in the response.
#[utoipa::path(
    post,
    path = "/devices",
    request_body = DeviceWriteRequest,
    responses(
        (status = 201, description = "Device registered", body = DeviceDto),
        (status = 500, description = "Internal server error"),
    ),
    tag = "devices"
)]
pub async fn create_device(
    State(state): State<AppState>,
    Json(req): Json<DeviceWriteRequest>,
) -> Result<(StatusCode, Json<DeviceDto>), ApiError> {
    let device = state.devices.register(req.into()).await?;
    Ok((StatusCode::CREATED, Json(device.into())))
}

#[utoipa::path(
    get,
    path = "/devices",
    responses(
        (status = 200, description = "Registered devices", body = Vec<DeviceDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<DeviceDto>>, ApiError> {
    let devices = state.devices.list(page.limit(), page.offset()).await?;
    Ok(Json(devices.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/devices/{id}",
    params(
        ("id" = i32, Path, description = "Internal device id"),
    ),
    responses(
        (status = 200, description = "Device", body = DeviceDto),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "devices"
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeviceDto>, ApiError> {
    let device = state.devices.get(id).await?;
    Ok(Json(device.into()))
}

/// Replace the mutable fields of a device. The published identifier never
/// changes.
#[utoipa::path(
    put,
    path = "/devices/{id}",
    params(
        ("id" = i32, Path, description = "Internal device id"),
    ),
    request_body = DeviceWriteRequest,
    responses(
        (status = 200, description = "Updated device", body = DeviceDto),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "devices"
)]
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<DeviceWriteRequest>,
) -> Result<Json<DeviceDto>, ApiError> {
    let device = state.devices.update(id, req.into()).await?;
    Ok(Json(device.into()))
}

#[utoipa::path(
    delete,
    path = "/devices/{id}",
    params(
        ("id" = i32, Path, description = "Internal device id"),
    ),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "devices"
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.devices.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Device logs
// ---------------------------------------------------------------------------

/// Readings for one device in ascending `recorded_at` order, optionally
/// bounded with `from`/`to` timestamps.
#[utoipa::path(
    get,
    path = "/devices/{id}/logs",
    params(
        ("id" = Uuid, Path, description = "Published device identifier"),
        ("from" = Option<DateTime<Utc>>, Query, description = "Inclusive RFC 3339 lower bound"),
        ("to" = Option<DateTime<Utc>>, Query, description = "Inclusive RFC 3339 upper bound"),
    ),
    responses(
        (status = 200, description = "Readings, oldest first", body = Vec<DeviceLogDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "device-logs"
)]
pub async fn list_device_logs(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Query(params): Query<LogRangeParams>,
) -> Result<Json<Vec<DeviceLogDto>>, ApiError> {
    let page = PageParams {
        limit: params.limit,
        offset: params.offset,
    };
    let logs = state
        .logs
        .list_for_device(device_id, params.from, params.to, page.limit(), page.offset())
        .await?;
    Ok(Json(logs.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/device-logs",
    responses(
        (status = 200, description = "Persisted readings", body = Vec<DeviceLogDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "device-logs"
)]
pub async fn list_all_device_logs(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<DeviceLogDto>>, ApiError> {
    let logs = state.logs.list(page.limit(), page.offset()).await?;
    Ok(Json(logs.into_iter().map(Into::into).collect()))
}

/// Persist a reading directly, bypassing the broker. The same referential
/// rule applies as on the MQTT path: the device must already be registered.
#[utoipa::path(
    post,
    path = "/device-logs",
    request_body = DeviceLogCreateRequest,
    responses(
        (status = 201, description = "Reading persisted", body = DeviceLogDto),
        (status = 404, description = "Device not registered"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "device-logs"
)]
pub async fn create_device_log(
    State(state): State<AppState>,
    Json(req): Json<DeviceLogCreateRequest>,
) -> Result<(StatusCode, Json<DeviceLogDto>), ApiError> {
    let device = state
        .devices
        .find_by_device_id(req.device_id)
        .await?
        .ok_or(ServiceError::DeviceNotRegistered(req.device_id))?;

    let log = state
        .logs
        .append(NewDeviceLog {
            device_id: device.device_id,
            payload: serde_json::Value::Object(req.payload),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(log.into())))
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/locations",
    request_body = LocationWriteRequest,
    responses(
        (status = 201, description = "Location created", body = LocationDto),
        (status = 400, description = "Coordinates out of range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<LocationWriteRequest>,
) -> Result<(StatusCode, Json<LocationDto>), ApiError> {
    let location = state.locations.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(location.into())))
}

#[utoipa::path(
    get,
    path = "/locations",
    responses(
        (status = 200, description = "Stored locations", body = Vec<LocationDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<LocationDto>>, ApiError> {
    let locations = state.locations.list(page.limit(), page.offset()).await?;
    Ok(Json(locations.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/locations/{id}",
    params(
        ("id" = i32, Path, description = "Location id"),
    ),
    responses(
        (status = 200, description = "Location", body = LocationDto),
        (status = 404, description = "Location not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LocationDto>, ApiError> {
    let location = state.locations.get(id).await?;
    Ok(Json(location.into()))
}

/// Replace a location's fields and geometry. Updates are idempotent:
/// repeating the same request leaves the stored point unchanged.
#[utoipa::path(
    put,
    path = "/locations/{id}",
    params(
        ("id" = i32, Path, description = "Location id"),
    ),
    request_body = LocationWriteRequest,
    responses(
        (status = 200, description = "Updated location", body = LocationDto),
        (status = 400, description = "Coordinates out of range"),
        (status = 404, description = "Location not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<LocationWriteRequest>,
) -> Result<Json<LocationDto>, ApiError> {
    let location = state.locations.update(id, req.into()).await?;
    Ok(Json(location.into()))
}

#[utoipa::path(
    delete,
    path = "/locations/{id}",
    params(
        ("id" = i32, Path, description = "Location id"),
    ),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Location not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.locations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// All locations within `radius` meters of the query point.
#[utoipa::path(
    post,
    path = "/locations/nearby",
    request_body = NearbyRequest,
    responses(
        (status = 200, description = "Locations within the radius", body = Vec<LocationDto>),
        (status = 400, description = "Coordinates or radius out of range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "locations"
)]
pub async fn find_nearby_locations(
    State(state): State<AppState>,
    Json(req): Json<NearbyRequest>,
) -> Result<Json<Vec<LocationDto>>, ApiError> {
    let found = state
        .locations
        .find_nearby(req.latitude, req.longitude, req.radius)
        .await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up"),
    ),
    tag = "health"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec struct (used in api/mod.rs)
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        create_device,
        list_devices,
        get_device,
        update_device,
        delete_device,
        list_device_logs,
        list_all_device_logs,
        create_device_log,
        create_location,
        list_locations,
        get_location,
        update_location,
        delete_location,
        find_nearby_locations,
        health,
    ),
    components(schemas(
        DeviceDto,
        DeviceWriteRequest,
        DeviceLogDto,
        DeviceLogCreateRequest,
        LocationDto,
        LocationWriteRequest,
        NearbyRequest,
    )),
    tags(
        (name = "devices", description = "Device registry endpoints"),
        (name = "device-logs", description = "Telemetry reading endpoints"),
        (name = "locations", description = "Geospatial location endpoints"),
        (name = "health", description = "Liveness probe"),
    ),
    info(
        title = "GeoTrack Service API",
        version = "0.1.0",
        description = "REST API for device telemetry and geospatial queries"
    )
)]
pub struct ApiDoc;
