//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sensorcast_sensors::{ErrorKind, SensorError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown to clients in place of internal error details.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A sensor operation failed.
    #[error("{context}: {source}")]
    Sensor {
        context: String,
        #[source]
        source: SensorError,
    },

    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Wrap a sensor error with what the server was doing.
    pub fn sensor(context: impl Into<String>, source: SensorError) -> Self {
        ServerError::Sensor {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::Sensor { source, .. } => source.kind(),
            ServerError::BadRequest(_) => ErrorKind::InvalidInput,
            ServerError::NotFound(_) => ErrorKind::NotFound,
            ServerError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// HTTP status and error code for each error kind.
pub fn status_and_code(kind: ErrorKind) -> (StatusCode, &'static str) {
    let status = match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, kind.code())
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, code) = status_and_code(kind);
        let detail = self.to_string();

        let message = match kind {
            ErrorKind::Internal => {
                tracing::error!(status = %status, code, error = %detail, "Server error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            _ => {
                tracing::warn!(status = %status, code, error = %detail, "Client error");
                detail
            }
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
