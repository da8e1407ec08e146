//! Tracker error types with exit status and HTTP status mapping.
//!
//! [`TrackerError`] is the central error type. The detection cycle maps it
//! to a process exit status; the dashboard API maps it to an HTTP status
//! and a structured JSON error body.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::FeedSource;

/// Structured JSON error response body.
///
/// All dashboard error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "not found: no comparison has been recorded yet"
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
}

/// Errors raised by fetchers, persistence, configuration and the API.
///
/// # Error Code Ranges
///
/// | Range     | Category           | Exit | HTTP Status               |
/// |-----------|--------------------|------|---------------------------|
/// | 1000–1999 | Feed / transport   | 2    | 502 Bad Gateway           |
/// | 2000–2999 | Request / lookup   | 3    | 400 / 404                 |
/// | 3000–3999 | Storage / config   | 3    | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Feed unreachable, timed out, or answered with a non-success status
    /// after every retry.
    #[error("{feed} feed transport error: {message}")]
    Transport {
        /// Feed being fetched.
        feed: FeedSource,
        /// Last underlying error.
        message: String,
    },

    /// Feed answered but the body could not be used.
    #[error("{feed} feed returned a malformed payload: {message}")]
    MalformedPayload {
        /// Feed being fetched.
        feed: FeedSource,
        /// Decoder or service error description.
        message: String,
    },

    /// Filesystem failure while reading or writing state.
    #[error("storage error: {0}")]
    Storage(String),

    /// Persisted state exists but cannot be decoded.
    #[error("corrupt state in {}: {message}", path.display())]
    CorruptState {
        /// File holding the corrupt state.
        path: PathBuf,
        /// Decoder error description.
        message: String,
    },

    /// Requested item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TrackerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Transport { .. } => 1001,
            Self::MalformedPayload { .. } => 1002,
            Self::InvalidRequest(_) => 2000,
            Self::NotFound(_) => 2001,
            Self::Storage(_) => 3001,
            Self::CorruptState { .. } => 3002,
            Self::Config(_) => 3003,
        }
    }

    /// Returns `true` for failures to obtain a feed snapshot.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::MalformedPayload { .. })
    }

    /// Returns the process exit status for a failed cycle.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_fetch_failure() { 2 } else { 3 }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Transport { .. } | Self::MalformedPayload { .. } => StatusCode::BAD_GATEWAY,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::CorruptState { .. } | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
