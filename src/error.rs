// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded ({limiter}), retry after {retry_after_secs}s")]
    RateLimited {
        limiter: &'static str,
        retry_after_secs: u64,
        headers: HeaderMap,
    },

    #[error("AI generation failed: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str, id: &str) -> Self {
        AppError::NotFound(format!("{} {} not found", what, id))
    }

    pub fn forbidden(what: &str, id: &str) -> Self {
        AppError::Forbidden(format!("{} {} belongs to another user", what, id))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    /// Offending fields for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = ErrorResponse {
            error: String::new(),
            details: None,
            fields: None,
            retry_after: None,
        };
        let mut extra_headers = HeaderMap::new();

        let status = match self {
            AppError::Unauthorized => {
                body.error = "unauthorized".into();
                StatusCode::UNAUTHORIZED
            }
            AppError::InvalidToken => {
                body.error = "invalid_token".into();
                StatusCode::UNAUTHORIZED
            }
            AppError::Validation(errors) => {
                let mut fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|field| field.to_string())
                    .collect();
                fields.sort();
                body.error = "validation_error".into();
                body.details = Some(errors.to_string());
                body.fields = Some(fields);
                StatusCode::BAD_REQUEST
            }
            AppError::BadRequest(msg) => {
                body.error = "bad_request".into();
                body.details = Some(msg);
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(msg) => {
                body.error = "not_found".into();
                body.details = Some(msg);
                StatusCode::NOT_FOUND
            }
            AppError::Forbidden(msg) => {
                tracing::warn!(reason = %msg, "Forbidden access attempt");
                body.error = "forbidden".into();
                StatusCode::FORBIDDEN
            }
            AppError::Conflict(msg) => {
                body.error = "conflict".into();
                body.details = Some(msg);
                StatusCode::CONFLICT
            }
            AppError::RateLimited {
                limiter,
                retry_after_secs,
                headers,
            } => {
                body.error = "rate_limited".into();
                body.details = Some(format!("{} limit exceeded", limiter));
                body.retry_after = Some(retry_after_secs);
                extra_headers = headers;
                StatusCode::TOO_MANY_REQUESTS
            }
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "AI generation failed");
                body.error = "upstream_error".into();
                body.details = Some(msg);
                StatusCode::BAD_GATEWAY
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                body.error = "database_error".into();
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                body.error = "internal_error".into();
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, extra_headers, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
