//! Error types for the session store.

use thiserror::Error;

/// Errors raised by key-value store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// The key holds a value of a different kind.
    #[error("key '{0}' holds a value of another type")]
    WrongType(String),
}

impl StoreError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

/// Result type for session store operations.
pub type StoreResult<T> = Result<T, StoreError>;
