//! Producer port.

use async_trait::async_trait;
use serde_json::Value;

use crate::bus::error::BusResult;

/// Publishing half of the bus client.
///
/// Publishing is fire-and-forget from the caller's point of view, but
/// implementations flush before returning: once `publish` returns `Ok`, the
/// record is durable on the broker.
#[async_trait]
pub trait BusProducer: Send + Sync {
    /// Publishes a mapping to `topic`, partitioned by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::bus::error::BusError::InvalidPayload`] when `value` is
    /// not a JSON object, or a transport error when the broker rejects or
    /// cannot receive the record.
    async fn publish(&self, topic: &str, value: &Value, key: &str) -> BusResult<()>;
}
