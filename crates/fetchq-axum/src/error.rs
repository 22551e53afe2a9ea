//! HTTP error type and the mapping from queue errors to status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use fetchq_core::QueueError;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (missing or malformed input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict (id already held by a live job).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input was valid but no format could be resolved for it.
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (Self::BadRequest(message)
        | Self::Conflict(message)
        | Self::Unprocessable(message)
        | Self::Internal(message)) = self;

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %message, "Request failed");
        }

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<QueueError> for HttpError {
    fn from(err: QueueError) -> Self {
        let message = err.user_message();
        match err {
            QueueError::MissingParameter { .. } | QueueError::InvalidQuality { .. } => {
                Self::BadRequest(message)
            }
            QueueError::AlreadyActive { .. } => Self::Conflict(message),
            QueueError::NoViableFormat { .. } => Self::Unprocessable(message),
            QueueError::WorkerSpawn { .. }
            | QueueError::WorkerExit { .. }
            | QueueError::Io { .. }
            | QueueError::Internal { .. } => Self::Internal(message),
        }
    }
}
