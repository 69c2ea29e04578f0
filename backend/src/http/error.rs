//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Malformed client input (bad id, bad JSON)
    BadRequest(String),
    /// Repository error
    Repository(RepositoryError),
}

impl AppError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Repository(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::BadRequest(msg) => ApiError::new("BAD_REQUEST", msg),
            AppError::Repository(e) if e.is_not_found() => {
                ApiError::new("NOT_FOUND", e.message())
            }
            // The cause is logged by the handler; clients get a generic message.
            AppError::Repository(RepositoryError::TimeoutError { .. }) => {
                ApiError::new("DATABASE_TIMEOUT", "Database operation timed out")
            }
            AppError::Repository(_) => {
                ApiError::new("REPOSITORY_ERROR", "Database operation failed")
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}
