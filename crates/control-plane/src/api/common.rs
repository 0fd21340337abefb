// Common DTOs for public API
//
// These types are shared across multiple API endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use newsdesk_core::NewsdeskError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Convert to axum response tuple
    pub fn into_response(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }
}

/// Outcome of a save or delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationResponse {
    /// Whether the operation completed.
    pub success: bool,
    /// Failure reason, present only when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A failed save or delete, rendered as `{success: false, error}`.
///
/// Storage failures are logged in full and reported to the client only as
/// `storage failure`. With `legacy_status` set, every failure other than
/// NotFound is answered with HTTP 200.
#[derive(Debug)]
pub struct OperationError {
    pub error: NewsdeskError,
    pub legacy_status: bool,
    /// Replaces the status derived from `error` (e.g. 413 for an oversized upload)
    pub status: Option<StatusCode>,
}

impl OperationError {
    pub fn new(error: NewsdeskError, legacy_status: bool) -> Self {
        Self {
            error,
            legacy_status,
            status: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        let (status, message) = self.derived_status_and_message();
        (self.status.unwrap_or(status), message)
    }

    fn derived_status_and_message(&self) -> (StatusCode, String) {
        match &self.error {
            NewsdeskError::MalformedRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            NewsdeskError::NotFound(_) => (StatusCode::NOT_FOUND, "article not found".to_string()),
            NewsdeskError::InvalidCredentials
            | NewsdeskError::Unauthenticated(_)
            | NewsdeskError::InvalidApiKey => {
                (StatusCode::UNAUTHORIZED, self.error.to_string())
            }
            NewsdeskError::StorageFailure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage failure".to_string(),
            ),
        }
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if self.error.is_storage() {
            tracing::error!("Storage failure: {}", self.error);
        }

        let status = if self.legacy_status && status != StatusCode::NOT_FOUND {
            StatusCode::OK
        } else {
            status
        };
        (status, Json(OperationResponse::failed(message))).into_response()
    }
}
