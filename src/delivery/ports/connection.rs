//! Live connection port.

use async_trait::async_trait;
use std::fmt;

use crate::delivery::{
    domain::{ConnectionId, OutboundMessage},
    error::DeliveryError,
};

/// A live, bidirectional connection to one user's client.
///
/// Owned by the transport layer; the bridge only ever sends through it.
#[async_trait]
pub trait LiveConnection: fmt::Debug + Send + Sync {
    /// Returns the connection identifier.
    fn id(&self) -> ConnectionId;

    /// Sends one message to the client.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the client cannot receive the message.
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}
