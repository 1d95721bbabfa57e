//! Error types for bus operations.

use std::sync::Arc;
use thiserror::Error;

/// Errors raised by bus producers and consumers.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The broker cannot be reached.
    #[error("bus unavailable: {0}")]
    Unavailable(String),

    /// The value to publish is not a mapping.
    #[error("bus payload for topic '{0}' must be a mapping")]
    InvalidPayload(String),

    /// The value could not be encoded.
    #[error("failed to encode record for topic '{topic}': {reason}")]
    Encoding {
        /// Target topic.
        topic: String,
        /// Description of the failure.
        reason: String,
    },

    /// The consumer referenced a partition it does not own.
    #[error("partition {partition} of topic '{topic}' is not assigned to this consumer")]
    UnassignedPartition {
        /// Topic name.
        topic: String,
        /// Partition index.
        partition: u32,
    },

    /// Low-level broker failure.
    #[error("bus runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl BusError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Wraps a runtime error from a broker adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;
