//! Correlation-keyed envelope publishing.

use std::sync::Arc;

use crate::bus::{error::BusResult, ports::BusProducer};
use crate::envelope::Envelope;

/// Publishes envelopes keyed by their correlation id.
///
/// Keying by correlation id keeps every event of one logical request on one
/// partition, preserving their relative order.
#[derive(Clone)]
pub struct EnvelopePublisher {
    producer: Arc<dyn BusProducer>,
}

impl std::fmt::Debug for EnvelopePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopePublisher").finish_non_exhaustive()
    }
}

impl EnvelopePublisher {
    /// Wraps a producer.
    #[must_use]
    pub fn new(producer: Arc<dyn BusProducer>) -> Self {
        Self { producer }
    }

    /// Publishes `envelope` to `topic`.
    ///
    /// # Errors
    ///
    /// Propagates the producer's [`crate::bus::error::BusError`].
    pub async fn publish(&self, topic: &str, envelope: &Envelope) -> BusResult<()> {
        let value = envelope.to_value();
        self.producer
            .publish(topic, &value, envelope.correlation_id().as_str())
            .await?;
        tracing::debug!(
            topic,
            event = envelope.event(),
            correlation_id = %envelope.correlation_id(),
            "published envelope"
        );
        Ok(())
    }
}
