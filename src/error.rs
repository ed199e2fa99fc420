//! Error types and result aliases for LeetNotes

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::services::{GeneratorError, QuotaError, SolutionError};

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Admin authorization required")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

impl From<SolutionError> for AppError {
    fn from(err: SolutionError) -> Self {
        match err {
            SolutionError::Quota(e) => AppError::Quota(e),
            SolutionError::Validation(msg) => AppError::Validation(msg),
            SolutionError::Generator(e) => AppError::Generator(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

/// Error response structure for the HTTP API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Quota(QuotaError::AuthenticationRequired) | AppError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Quota(QuotaError::QuotaExceeded { .. }) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Generator(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::Quota(QuotaError::Database(_))
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let (code, details) = match err {
            AppError::Database(_) | AppError::Quota(QuotaError::Database(_)) => {
                ("DATABASE_ERROR", None)
            }
            AppError::Quota(QuotaError::AuthenticationRequired) => {
                ("AUTHENTICATION_REQUIRED", None)
            }
            AppError::Quota(QuotaError::QuotaExceeded {
                action,
                plan,
                used,
                limit,
            }) => (
                "QUOTA_EXCEEDED",
                Some(serde_json::json!({
                    "action": action,
                    "plan": plan,
                    "used": used,
                    "limit": limit,
                })),
            ),
            AppError::Generator(_) => ("UPSTREAM_UNAVAILABLE", None),
            AppError::Validation(_) => ("VALIDATION_ERROR", None),
            AppError::NotFound(_) => ("NOT_FOUND", None),
            AppError::Forbidden(_) => ("FORBIDDEN", None),
            AppError::Unauthorized => ("UNAUTHORIZED", None),
            AppError::Internal(_) => ("INTERNAL_ERROR", None),
        };

        ErrorResponse {
            code: code.to_string(),
            message: err.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
