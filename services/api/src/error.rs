//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::service::{ConflictInfo, ReservationError};

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid input, naming the offending field
    #[error("{message}")]
    BadRequest {
        field: &'static str,
        message: String,
    },

    /// The caller may not touch this resource
    #[error("Not allowed to modify this reservation")]
    Forbidden,

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// The room is already booked in the requested interval
    #[error("Room already booked in this interval")]
    Conflict(Option<ConflictInfo>),

    /// The resource changed since the client's request was evaluated
    #[error("Reservation was modified concurrently; reload and retry")]
    Modified,

    /// Storage is temporarily unreachable
    #[error("Storage temporarily unavailable")]
    Unavailable,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::Validation { field, message } => {
                ApiError::BadRequest { field, message }
            }
            ReservationError::Conflict(existing) => ApiError::Conflict(existing),
            ReservationError::NotFound => ApiError::NotFound("Reservation not found".to_string()),
            ReservationError::Stale => ApiError::Modified,
            ReservationError::RoomNotFound(id) => ApiError::NotFound(format!("Room {id} not found")),
            ReservationError::Authorization => ApiError::Forbidden,
            ReservationError::TransientStorage => ApiError::Unavailable,
            ReservationError::Storage(message) => {
                tracing::error!("Storage failure: {}", message);
                ApiError::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, body) = match self {
            ApiError::BadRequest { field, .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": message })),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            ApiError::Conflict(existing) => (
                StatusCode::CONFLICT,
                json!({ "error": message, "conflict": existing }),
            ),
            ApiError::Modified => (StatusCode::CONFLICT, json!({ "error": message })),
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": message }),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ReservationError::Validation {
                    field: "title",
                    message: "title is required".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (ReservationError::Conflict(None), StatusCode::CONFLICT),
            (ReservationError::NotFound, StatusCode::NOT_FOUND),
            (ReservationError::Stale, StatusCode::CONFLICT),
            (ReservationError::RoomNotFound(7), StatusCode::NOT_FOUND),
            (ReservationError::Authorization, StatusCode::FORBIDDEN),
            (
                ReservationError::TransientStorage,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ReservationError::Storage("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
