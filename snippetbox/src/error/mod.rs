//! Error types and their HTTP responses
//!
//! Validation problems never reach this type: handlers attach them to the
//! [`Form`](crate::forms::Form) and re-render with 200. What remains is:
//!
//! - client errors, answered with their status text
//! - not-found, answered with 404
//! - everything else, logged in full and answered with a bare 500

use crate::auth::SessionError;
use crate::models::StoreError;
use crate::template::RenderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Request-level error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request
    #[error("client error: {0}")]
    Client(StatusCode),

    /// Unknown resource
    #[error("not found")]
    NotFound,

    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Template failure
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Session failure
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

impl AppError {
    /// Shorthand for a 400 Bad Request
    #[must_use]
    pub const fn bad_request() -> Self {
        Self::Client(StatusCode::BAD_REQUEST)
    }
}

/// A response carrying only `status` and its canonical reason
#[must_use]
pub fn status_response(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Client(status) => status_response(status),
            Self::NotFound | Self::Store(StoreError::NotFound) => status_response(StatusCode::NOT_FOUND),
            other => {
                tracing::error!(error = %other, details = ?other, "server error");
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
