//! Error types for batch coordination.
//!

use crate::config::ConfigurationError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// A completion callback failed; later callbacks in the ordered set were not invoked
    #[error("Completion callback '{callback}' failed: {message}")]
    CallbackFailed { callback: String, message: String },
    #[error("Invalid callback name '{name}': completion callbacks must start with 'after_batch'")]
    InvalidCallbackName { name: String },
    #[error("Completion callback '{name}' is already registered")]
    DuplicateCallback { name: String },
}

pub type BatchResult<T> = Result<T, BatchError>;
