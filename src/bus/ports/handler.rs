//! Handler port invoked once per consumed record.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a record handler.
///
/// A failing handler leaves the record uncommitted so it is delivered again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error from any displayable cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Callback receiving decoded records from a consume loop.
#[async_trait]
pub trait RecordHandler: Send + Sync {
    /// Handles one decoded record.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the record should be redelivered.
    async fn handle(
        &self,
        topic: &str,
        payload: Value,
        key: Option<&str>,
    ) -> Result<(), HandlerError>;
}
