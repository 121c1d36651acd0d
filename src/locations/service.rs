use std::sync::Arc;

use tracing::debug;

use crate::db::models::Location;
use crate::error::{ServiceError, ServiceResult};

use super::store::{LocationInput, LocationStore};

/// Largest accepted search radius, in meters (100 km).
pub const MAX_RADIUS_METERS: f64 = 100_000.0;

/// Coordinate validation and CRUD over the location store, plus the
/// proximity query. Nothing below this layer re-checks ranges; nothing above
/// it sees raw geometry.
pub struct LocationService {
    store: Arc<dyn LocationStore>,
}

impl LocationService {
    pub fn new(store: Arc<dyn LocationStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: LocationInput) -> ServiceResult<Location> {
        validate_point(input.latitude, input.longitude)?;
        let location = self.store.insert(input).await?;
        debug!(location_id = location.id, name = %location.name, "location created");
        Ok(location)
    }

    pub async fn get(&self, id: i32) -> ServiceResult<Location> {
        self.store
            .get(id)
            .await?
            .ok_or(ServiceError::LocationNotFound(id))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<Location>> {
        self.store.list(limit, offset).await
    }

    /// Full replacement of a location's fields and geometry. Repeating the
    /// same update leaves the stored geometry unchanged.
    pub async fn update(&self, id: i32, input: LocationInput) -> ServiceResult<Location> {
        validate_point(input.latitude, input.longitude)?;
        self.store
            .update(id, input)
            .await?
            .ok_or(ServiceError::LocationNotFound(id))
    }

    pub async fn delete(&self, id: i32) -> ServiceResult<()> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::LocationNotFound(id))
        }
    }

    /// Locations within `radius_meters` of a WGS84 query point.
    ///
    /// The distance test runs in the planar EPSG 3857 projection; comparing
    /// raw degree deltas would be meaningless at any useful radius.
    pub async fn find_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> ServiceResult<Vec<Location>> {
        validate_point(latitude, longitude)?;
        if !(radius_meters > 0.0 && radius_meters <= MAX_RADIUS_METERS) {
            return Err(ServiceError::InvalidRadius(radius_meters));
        }
        let found = self
            .store
            .find_within_radius(latitude, longitude, radius_meters)
            .await?;
        debug!(
            latitude,
            longitude,
            radius_meters,
            matches = found.len(),
            "proximity query executed"
        );
        Ok(found)
    }
}

fn validate_point(latitude: f64, longitude: f64) -> ServiceResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ServiceError::InvalidLatitude(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ServiceError::InvalidLongitude(longitude));
    }
    Ok(())
}
