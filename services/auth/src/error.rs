//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::TokenError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// SQLSTATE raised on a unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid input, naming the offending field
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Username or email already taken
    #[error("Username or email already registered")]
    AlreadyRegistered,

    /// Unknown user or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Missing, invalid or expired token
    #[error("Unauthorized")]
    Unauthorized,

    /// The user store cannot be reached
    #[error("Service temporarily unavailable")]
    Unavailable,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl AuthError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                AuthError::AlreadyRegistered
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                error!("User store unavailable: {}", err);
                AuthError::Unavailable
            }
            _ => {
                error!("User store error: {}", err);
                AuthError::InternalServerError
            }
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) | TokenError::WrongType => AuthError::Unauthorized,
            TokenError::MissingSecret | TokenError::Encode(_) => {
                error!("Failed to issue token: {}", err);
                AuthError::InternalServerError
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        let (status, body) = match self {
            AuthError::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            AuthError::AlreadyRegistered => (StatusCode::CONFLICT, json!({ "error": message })),
            AuthError::InvalidCredentials | AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": message }))
            }
            AuthError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": message }),
            ),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
