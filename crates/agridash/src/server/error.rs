//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::Error;

/// Machine-readable error category in an error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorCode {
    /// The submission was missing or malformed.
    ValidationError,
    /// The record store failed.
    StorageError,
    /// Anything else.
    InternalError,
}

/// Body of every non-success response: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// The error details.
    pub error: ErrorBody,
}

/// Details of an [`ErrorPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error category.
    pub code: ApiErrorCode,
    /// Human-readable description.
    pub message: String,
}

/// An error on its way out of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    /// A 400 for a payload that could not be read as an observation.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                code: ApiErrorCode::ValidationError,
                message: message.into(),
            },
        }
    }

    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Error category of the response.
    #[must_use]
    pub fn code(&self) -> ApiErrorCode {
        self.body.code
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_validation() {
            return Self::validation(err.to_string());
        }

        error!(error = %err, "Request failed");
        let code = if err.is_storage() {
            ApiErrorCode::StorageError
        } else {
            ApiErrorCode::InternalError
        };
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                code,
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorPayload { error: self.body })).into_response()
    }
}
