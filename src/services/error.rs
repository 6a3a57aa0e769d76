use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

/// Failures of the booking operations, mapped to HTTP at the request boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Permission(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Training {0} is not available for this user")]
    NotAvailable(i64),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(err: impl std::fmt::Display) -> Self {
        ServiceError::Validation(err.to_string())
    }

    pub fn training_not_found(training_id: i64) -> Self {
        ServiceError::NotFound(format!("Training with id={training_id}"))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Permission(_) => "permission_denied",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::NotAvailable(_) => "not_available",
            ServiceError::Auth(_) => "auth_error",
            ServiceError::Database(_) | ServiceError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Permission(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) | ServiceError::NotAvailable(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Auth(err) => err.status_code(),
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ServiceError::Auth(err) => err.into_response(),
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    status,
                    Json(json!({
                        "error": self.error_code(),
                        "message": "Internal server error",
                    })),
                )
                    .into_response()
            }
            _ => (
                status,
                Json(json!({
                    "error": self.error_code(),
                    "message": self.to_string(),
                })),
            )
                .into_response(),
        }
    }
}
