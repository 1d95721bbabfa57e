//! At-least-once consume loop.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

use crate::bus::{
    domain::{BusRecord, RecordPosition},
    error::BusResult,
    ports::{BusConsumer, RecordHandler},
};

/// Tunables of a [`ConsumeLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeSettings {
    /// Upper bound of a single poll.
    pub poll_timeout: Duration,
    /// Handler failures tolerated for one record before it is skipped.
    pub max_redeliveries: u32,
}

impl Default for ConsumeSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(1000),
            max_redeliveries: 5,
        }
    }
}

/// Outcome of processing one polled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDisposition {
    /// The handler succeeded and the offset was committed.
    Committed,
    /// The record could not be decoded; it was logged and committed.
    SkippedMalformed,
    /// The handler failed; the partition was rewound to the record.
    Redelivering {
        /// Number of failed attempts so far.
        attempt: u32,
    },
    /// The handler kept failing; the record was logged and committed.
    SkippedAfterRedeliveries,
}

/// Sequential poll, handle, commit loop over one consumer.
///
/// One record is fully handled before the next poll. Offsets are committed
/// only after the handler succeeds; a failing record is sought back so the
/// next poll returns it again.
pub struct ConsumeLoop<C> {
    name: String,
    consumer: C,
    settings: ConsumeSettings,
    failures: HashMap<RecordPosition, u32>,
}

impl<C: BusConsumer> ConsumeLoop<C> {
    /// Creates a loop named `name` (used in logs).
    pub fn new(name: impl Into<String>, consumer: C, settings: ConsumeSettings) -> Self {
        Self {
            name: name.into(),
            consumer,
            settings,
            failures: HashMap::new(),
        }
    }

    /// Returns the loop name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wrapped consumer.
    pub const fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    /// Polls once and handles the record, if any.
    ///
    /// Returns `Ok(None)` when the poll timed out.
    ///
    /// # Errors
    ///
    /// Returns the consumer's error when polling fails. Commit and seek
    /// failures are logged, not returned.
    pub async fn step<H>(&mut self, handler: &H) -> BusResult<Option<RecordDisposition>>
    where
        H: RecordHandler + ?Sized,
    {
        let Some(record) = self.consumer.poll(self.settings.poll_timeout).await? else {
            return Ok(None);
        };

        let payload: Value = match serde_json::from_slice(&record.value) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(
                    consumer = %self.name,
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %err,
                    "skipping undecodable record"
                );
                self.commit(&record).await;
                return Ok(Some(RecordDisposition::SkippedMalformed));
            }
        };

        match handler
            .handle(&record.topic, payload, record.key.as_deref())
            .await
        {
            Ok(()) => {
                self.failures.remove(&record.position());
                self.commit(&record).await;
                Ok(Some(RecordDisposition::Committed))
            }
            Err(err) => Ok(Some(self.handler_failed(&record, err.message()).await)),
        }
    }

    async fn handler_failed(&mut self, record: &BusRecord, reason: &str) -> RecordDisposition {
        let position = record.position();
        let attempt = {
            let count = self.failures.entry(position.clone()).or_insert(0);
            *count = count.saturating_add(1);
            *count
        };

        if attempt > self.settings.max_redeliveries {
            tracing::error!(
                consumer = %self.name,
                topic = %record.topic,
                offset = record.offset,
                attempt,
                reason,
                "handler kept failing; skipping record"
            );
            self.failures.remove(&position);
            self.commit(record).await;
            return RecordDisposition::SkippedAfterRedeliveries;
        }

        tracing::warn!(
            consumer = %self.name,
            topic = %record.topic,
            offset = record.offset,
            attempt,
            reason,
            "handler failed; record will be redelivered"
        );
        if let Err(err) = self
            .consumer
            .seek(&record.topic, record.partition, record.offset)
            .await
        {
            tracing::error!(consumer = %self.name, error = %err, "failed to rewind partition");
        }
        RecordDisposition::Redelivering { attempt }
    }

    async fn commit(&mut self, record: &BusRecord) {
        if let Err(err) = self.consumer.commit(record).await {
            tracing::error!(
                consumer = %self.name,
                topic = %record.topic,
                offset = record.offset,
                error = %err,
                "offset commit failed"
            );
        }
    }

    /// Runs until `shutdown` turns true or polling fails.
    ///
    /// Shutdown is observed between polls, so it takes effect within one poll
    /// timeout; a record in progress is always handled to completion.
    ///
    /// # Errors
    ///
    /// Returns the consumer's error when polling fails.
    pub async fn run<H>(mut self, handler: &H, mut shutdown: watch::Receiver<bool>) -> BusResult<()>
    where
        H: RecordHandler + ?Sized,
    {
        tracing::info!(consumer = %self.name, "consume loop started");
        loop {
            let sender_gone = shutdown.has_changed().is_err();
            if sender_gone || *shutdown.borrow_and_update() {
                break;
            }
            if let Err(err) = self.step(handler).await {
                tracing::error!(consumer = %self.name, error = %err, "poll failed");
                return Err(err);
            }
        }
        tracing::info!(consumer = %self.name, "consume loop stopped");
        Ok(())
    }
}
