//! Live connection backed by a tokio channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::delivery::{
    domain::{ConnectionId, OutboundMessage},
    error::DeliveryError,
    ports::LiveConnection,
};

/// Connection whose client end is an [`mpsc::Receiver`].
///
/// Transports forward the receiver to their socket writer; dropping the
/// receiver closes the connection.
#[derive(Debug, Clone)]
pub struct ChannelConnection {
    id: ConnectionId,
    sender: mpsc::Sender<OutboundMessage>,
}

impl ChannelConnection {
    /// Opens a connection with room for `capacity` unread messages.
    #[must_use]
    pub fn open(capacity: usize) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: ConnectionId::new(),
                sender,
            },
            receiver,
        )
    }
}

#[async_trait]
impl LiveConnection for ChannelConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        self.sender
            .send(message.clone())
            .await
            .map_err(|_| DeliveryError::Closed(self.id))
    }
}
