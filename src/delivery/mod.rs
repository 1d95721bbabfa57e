//! Delivery of bus events to live user connections.
//!
//! The final response topics are consumed by a single bridge that hands each
//! record over a bounded channel to a dispatcher task. The dispatcher appends
//! the normalised message to the user's FIFO buffer and flushes that buffer
//! to every live connection the user has, re-queuing the undelivered
//! remainder at the head of the buffer when a send fails.
//!
//! - **Domain**: [`domain::OutboundMessage`], [`domain::DeliveryBuffer`],
//!   [`domain::HistoryEntry`] and the inbound request shape
//! - **Ports**: [`ports::LiveConnection`] and [`ports::ChatHistoryRepository`]
//! - **Adapters**: channel-backed connections, in-memory and `PostgreSQL`
//!   chat history
//! - **Services**: [`services::ConnectionRegistry`],
//!   [`services::DeliveryBridge`], [`services::DeliveryDispatcher`] and the
//!   ingress [`services::ChatGateway`]
//!
//! Ordering is guaranteed per user: messages reach a user's connections in
//! the order the bridge received them, and nothing is dropped while the
//! buffer bound is respected.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
