//! Pull-based consumer port.

use async_trait::async_trait;
use std::time::Duration;

use crate::bus::{domain::BusRecord, error::BusResult};

/// Subscribing half of the bus client.
///
/// A consumer owns a set of topic partitions within a consumer group. Its
/// read position advances on every poll; the committed offset, from which a
/// restarted member of the group resumes, only advances on [`commit`].
///
/// [`commit`]: BusConsumer::commit
#[async_trait]
pub trait BusConsumer: Send {
    /// Waits up to `timeout` for the next record.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns a bus error when the broker connection is lost; consumers
    /// treat this as fatal.
    async fn poll(&mut self, timeout: Duration) -> BusResult<Option<BusRecord>>;

    /// Commits the offset after `record` for the consumer group.
    ///
    /// # Errors
    ///
    /// Returns a bus error when the commit cannot be recorded.
    async fn commit(&mut self, record: &BusRecord) -> BusResult<()>;

    /// Moves the read position of one partition back (or forward) to `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::bus::error::BusError::UnassignedPartition`] when the
    /// partition is not owned by this consumer.
    async fn seek(&mut self, topic: &str, partition: u32, offset: u64) -> BusResult<()>;
}
