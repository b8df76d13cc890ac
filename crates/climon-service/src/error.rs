//! Service error types.

use climon_core::error::ClimonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing or invalid credential")]
    InvalidCredential,

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("registration rejected: {0}")]
    RegistrationRejected(String),

    #[error("alert dispatch failed: {0}")]
    Dispatch(String),
}

impl From<ServiceError> for ClimonError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredential => ClimonError::Unauthorized,
            ServiceError::Malformed(message) => ClimonError::MalformedRequest { message },
            ServiceError::Forbidden(reason) => ClimonError::Forbidden { reason },
            ServiceError::RegistrationRejected(reason) => {
                ClimonError::RegistrationFailed { reason }
            }
            ServiceError::Dispatch(msg) => ClimonError::Dispatch(msg),
        }
    }
}
