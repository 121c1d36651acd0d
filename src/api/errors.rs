use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ServiceError;

/// HTTP-facing wrapper for service failures: validation maps to 400,
/// missing rows to 404 and anything touching the database to 500.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            ServiceError::InvalidLatitude(_)
            | ServiceError::InvalidLongitude(_)
            | ServiceError::InvalidRadius(_) => StatusCode::BAD_REQUEST,
            ServiceError::DeviceNotFound(_)
            | ServiceError::DeviceNotRegistered(_)
            | ServiceError::LocationNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}
