//! Delivery domain types.

mod buffer;
mod connection;
mod history;
mod inbound;
mod outbound;

pub use buffer::{DEFAULT_BUFFER_LIMIT, DeliveryBuffer, FlushReport};
pub use connection::ConnectionId;
pub use history::{Direction, HistoryEntry, HistoryEntryId, PersistedHistoryEntry};
pub use inbound::{InboundMessage, UploadNotice};
pub use outbound::OutboundMessage;
