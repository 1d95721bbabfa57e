//! Bus client: publish and pull-based subscribe with manual commits.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::BusRecord`] and key-to-partition assignment
//! - **Ports**: [`ports::BusProducer`], [`ports::BusConsumer`] and the
//!   [`ports::RecordHandler`] invoked once per record
//! - **Adapters**: [`adapters::memory::InMemoryBus`], a partitioned broker
//!   with consumer groups and committed offsets
//! - **Services**: [`services::ConsumeLoop`] (at-least-once consumption) and
//!   [`services::EnvelopePublisher`] (correlation-keyed publishing)
//!
//! Records are keyed by correlation id so every event of one logical request
//! lands on the same partition and keeps its relative order. Offsets are
//! committed only after the handler returns successfully, so handlers must
//! tolerate being re-invoked with the same input.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
