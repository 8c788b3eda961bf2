use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The session is not in a state that allows this operation
    /// (missing inputs, or a mutating call is already in flight).
    #[error("Not ready: {0}")]
    NotReady(String),

    /// Free-tier credit limit reached. The caller should offer an upgrade.
    #[error("Plan credit limit reached")]
    QuotaExceeded,

    /// The external generative service failed or returned unusable output.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotReady(msg) => (StatusCode::CONFLICT, "NOT_READY", msg.clone()),
            AppError::QuotaExceeded => (
                StatusCode::PAYMENT_REQUIRED,
                "QUOTA_EXCEEDED",
                "Free plan credit limit reached. Upgrade to continue.".to_string(),
            ),
            AppError::Collaborator(msg) => {
                tracing::error!("Collaborator error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "COLLABORATOR_ERROR",
                    "An AI processing error occurred. Please try again.".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
