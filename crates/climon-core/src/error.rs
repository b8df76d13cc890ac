//! Error types for the CLIMON system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimonError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unauthorized: missing or invalid credential")]
    Unauthorized,

    #[error("Malformed request: {message}")]
    MalformedRequest { message: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Registration failed: {reason}")]
    RegistrationFailed { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    /// Alert delivery failures are soft: logged and reported in response
    /// metadata, never propagated as a request failure.
    #[error("Alert dispatch failed: {0}")]
    Dispatch(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ClimonResult<T> = Result<T, ClimonError>;
