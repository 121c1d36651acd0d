use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::models::Location;
use crate::error::ServiceResult;

/// Point payload for create and update. Coordinates are WGS84 degrees,
/// validated by `LocationService` before they reach the store.
#[derive(Debug, Clone)]
pub struct LocationInput {
    pub name: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Persistence seam for named points.
///
/// Geometry lives in the database as `geometry(Point, 4326)`; rows come back
/// with latitude/longitude extracted so nothing above this layer handles raw
/// geometry values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn insert(&self, input: LocationInput) -> ServiceResult<Location>;

    async fn get(&self, id: i32) -> ServiceResult<Option<Location>>;

    async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<Location>>;

    /// Replaces name, description and geometry wholesale and stamps
    /// `updated_at`. Returns `None` when the id is unknown.
    async fn update(&self, id: i32, input: LocationInput) -> ServiceResult<Option<Location>>;

    /// Returns `false` when the id is unknown.
    async fn delete(&self, id: i32) -> ServiceResult<bool>;

    /// All locations within `radius_meters` of the query point. Both sides
    /// are reprojected to EPSG 3857 so the radius is compared in meters, not
    /// degrees.
    async fn find_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> ServiceResult<Vec<Location>>;
}

#[derive(Clone)]
pub struct PgLocationStore {
    pool: PgPool,
}

impl PgLocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    async fn insert(&self, input: LocationInput) -> ServiceResult<Location> {
        let location = sqlx::query_as::<_, Location>(
            "INSERT INTO locations (name, description, geom) \
             VALUES ($1, $2, ST_SetSRID(ST_MakePoint($3, $4), 4326)) \
             RETURNING id, name, description, \
                       ST_Y(geom) AS latitude, ST_X(geom) AS longitude, \
                       created_at, updated_at",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.longitude)
        .bind(input.latitude)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }

    async fn get(&self, id: i32) -> ServiceResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT id, name, description, \
                    ST_Y(geom) AS latitude, ST_X(geom) AS longitude, \
                    created_at, updated_at \
             FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(location)
    }

    async fn list(&self, limit: i64, offset: i64) -> ServiceResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, name, description, \
                    ST_Y(geom) AS latitude, ST_X(geom) AS longitude, \
                    created_at, updated_at \
             FROM locations ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    async fn update(&self, id: i32, input: LocationInput) -> ServiceResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            "UPDATE locations \
             SET name = $2, description = $3, \
                 geom = ST_SetSRID(ST_MakePoint($4, $5), 4326), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING id, name, description, \
                       ST_Y(geom) AS latitude, ST_X(geom) AS longitude, \
                       created_at, updated_at",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.longitude)
        .bind(input.latitude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(location)
    }

    async fn delete(&self, id: i32) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> ServiceResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, name, description, \
                    ST_Y(geom) AS latitude, ST_X(geom) AS longitude, \
                    created_at, updated_at \
             FROM locations \
             WHERE ST_DWithin( \
                 ST_Transform(geom, 3857), \
                 ST_Transform(ST_SetSRID(ST_MakePoint($1, $2), 4326), 3857), \
                 $3 \
             ) \
             ORDER BY id",
        )
        .bind(longitude)
        .bind(latitude)
        .bind(radius_meters)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }
}
