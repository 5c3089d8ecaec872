//! Store error types

use thiserror::Error;

/// Errors that can occur while talking to the shared batch store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the store backend
    #[error("Store connection error: {0}")]
    ConnectionError(String),

    /// A store command failed
    #[error("Store backend error: {0}")]
    BackendError(String),

    /// A key held a value that could not be used as a counter
    #[error("Invalid value at '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
