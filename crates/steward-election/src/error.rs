//! Error types for leader election.

use steward_lease::StoreError;
use thiserror::Error;

/// Result type alias for election operations.
pub type ElectionResult<T> = Result<T, ElectionError>;

#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("lease store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid election config: {0}")]
    InvalidConfig(String),

    #[error("election round timed out after {0:?}")]
    Timeout(std::time::Duration),
}
