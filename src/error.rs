use uuid::Uuid;

/// Failures produced by the stores and services.
///
/// Validation, not-found and persistence failures stay distinguishable so
/// callers can react precisely: the API layer maps each class to a different
/// status code and the ingestion pipeline logs them on different branches.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Latitude outside [-90, 90] degrees.
    #[error("invalid latitude {0}: must be between -90 and 90 degrees")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] degrees.
    #[error("invalid longitude {0}: must be between -180 and 180 degrees")]
    InvalidLongitude(f64),

    /// Search radius outside (0, 100000] meters.
    #[error("invalid radius {0}: must be greater than 0 and at most 100000 meters")]
    InvalidRadius(f64),

    /// No device row with this internal id.
    #[error("device {0} not found")]
    DeviceNotFound(i32),

    /// No device registered under this published identifier.
    #[error("no device registered with id {0}")]
    DeviceNotRegistered(Uuid),

    /// No location row with this id.
    #[error("location {0} not found")]
    LocationNotFound(i32),

    /// Underlying database failure. Any enclosing unit of work has been
    /// rolled back when this surfaces.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
