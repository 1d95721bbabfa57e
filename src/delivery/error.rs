//! Error types for live delivery, chat history and ingress.

use std::sync::Arc;
use thiserror::Error;

use crate::bus::error::BusError;
use crate::delivery::domain::ConnectionId;
use crate::envelope::ValidationError;

/// Failure to hand a message to a live connection.
///
/// Never surfaced to the producing side: the message stays buffered and is
/// retried on the next flush.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The connection's receiving end has gone away.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    /// The transport rejected the message.
    #[error("failed to send to connection {connection}: {reason}")]
    Send {
        /// Connection the send was attempted on.
        connection: ConnectionId,
        /// Description of the failure.
        reason: String,
    },

    /// The dispatcher task is no longer accepting commands.
    #[error("delivery dispatcher has stopped")]
    DispatcherStopped,
}

/// Errors returned by chat history repositories.
#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    /// The repository cannot be reached.
    #[error("chat history unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be mapped back to an entry.
    #[error("corrupt chat history row: {0}")]
    Corrupt(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl HistoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Result type for chat history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors raised while accepting input from a live connection.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The inbound frame has no `message` object.
    #[error("no message provided")]
    MissingMessage,

    /// The message carries no usable text.
    #[error("message text must not be empty")]
    MissingText,

    /// An upload notice lacks a required field.
    #[error("upload notice missing field: {0}")]
    MissingUploadField(&'static str),

    /// The frame is not shaped as expected.
    #[error("malformed inbound message: {0}")]
    Malformed(String),

    /// The resulting envelope failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Publishing to the bus failed.
    #[error(transparent)]
    Publish(#[from] BusError),
}
