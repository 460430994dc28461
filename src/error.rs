// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::archive::ImportError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Strava rejected the access token.
    #[error("Strava access token rejected")]
    Unauthorized,

    /// Token refresh failed or was impossible.
    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Strava API error: {0}")]
    StravaApi(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const STRAVA_RATE_LIMIT: &'static str = "Rate limit exceeded";
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "session_expired",
                Some(self.to_string()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Import(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "import_failed",
                Some(err.to_string()),
            ),
            AppError::StravaApi(msg) => {
                (StatusCode::BAD_GATEWAY, "strava_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
