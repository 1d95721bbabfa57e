//! Error types for agent processing.

use thiserror::Error;

use crate::bus::error::BusError;
use crate::envelope::ValidationError;
use crate::session::error::StoreError;

/// Errors produced while an agent handles one record.
///
/// Only [`AgentError::Publish`] leaves the record uncommitted; every other
/// variant is terminal for the record.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The envelope or its payload is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A key the record refers to does not exist in the session store.
    #[error("not found: {0}")]
    NotFound(String),

    /// An external call failed on every attempt.
    #[error("{operation} unavailable after {attempts} attempts: {reason}")]
    UpstreamUnavailable {
        /// Name of the external operation.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        reason: String,
    },

    /// The session store rejected a write with no fallback.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// A downstream event could not be published.
    #[error("failed to publish downstream event: {0}")]
    Publish(#[from] BusError),

    /// The agent does not handle the record's event.
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    /// A prompt template could not be rendered.
    #[error(transparent)]
    Prompt(#[from] crate::agent::services::PromptError),
}

impl AgentError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
