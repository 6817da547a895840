//! Error types for lease stores.

use thiserror::Error;

/// Result type alias for lease store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing lease records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to lease store: {0}")]
    Connect(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("lease already exists: {0}")]
    AlreadyExists(String),

    #[error("lease not found: {0}")]
    NotFound(String),

    #[error("failed to decode lease row: {0}")]
    Decode(String),

    #[error("lease store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::AlreadyExists(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Connect(e.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_) => StoreError::Decode(e.to_string()),
            _ => StoreError::Query(e.to_string()),
        }
    }
}
