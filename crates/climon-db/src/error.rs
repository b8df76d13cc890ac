//! Database-specific error types and conversions.

use climon_core::error::ClimonError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    /// A unique-index violation. Duplicate registrations end up here —
    /// the index, not application logic, is the source of truth.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify a statement-level failure, turning unique-index
    /// violations into [`DbError::Conflict`].
    pub(crate) fn from_statement(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Conflict(message)
        } else {
            DbError::Surreal(err)
        }
    }
}

impl From<DbError> for ClimonError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ClimonError::NotFound { entity, id },
            DbError::Conflict(reason) => ClimonError::RegistrationFailed { reason },
            other => ClimonError::Database(other.to_string()),
        }
    }
}
