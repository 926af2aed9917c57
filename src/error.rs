//! Application error types with HTTP status code mapping.
//!
//! [`AppError`] is the central error type for the HTTP surface and the
//! store collaborators. Each variant maps to a specific HTTP status code
//! and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: amount must be positive"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                 |
/// |-----------|------------------|-----------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request             |
/// | 2000–2999 | Auth / Not Found | 401 Unauthorized / 404      |
/// | 3000–3999 | Server           | 500 / 502                   |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Webhook signature missing, malformed, stale or wrong.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The streaming platform rejected the presented credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No streamer matches the presented connection secret.
    #[error("streamer not found")]
    StreamerNotFound,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// The payment processor or identity provider failed.
    #[error("upstream error: {0}")]
    UpstreamError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidSignature(_) => 1002,
            Self::Unauthorized(_) => 2001,
            Self::StreamerNotFound => 2002,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::UpstreamError(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::StreamerNotFound => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::PersistenceError(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        Self::UpstreamError(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
