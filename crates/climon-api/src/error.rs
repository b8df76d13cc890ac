//! API error types and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use climon_core::ClimonError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Domain(#[from] ClimonError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            ApiError::Domain(err) => match err {
                ClimonError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
                }
                ClimonError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", err.to_string())
                }
                ClimonError::MalformedRequest { .. } => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
                }
                ClimonError::Forbidden { .. } => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string())
                }
                ClimonError::RegistrationFailed { .. } => {
                    (StatusCode::CONFLICT, "CONFLICT", err.to_string())
                }
                ClimonError::Database(_) | ClimonError::Dispatch(_) | ClimonError::Internal(_) => {
                    // Internals are logged, not leaked.
                    error!(error = %err, "Internal error serving request");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "internal error".to_string(),
                    )
                }
            },
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
