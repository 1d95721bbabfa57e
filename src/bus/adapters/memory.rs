//! In-memory partitioned broker.
//!
//! Models the semantics the consume loop relies on: per-key partitioning,
//! consumer groups with committed offsets, read positions that advance on
//! poll independently of commits, and seeking for redelivery.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::bus::{
    domain::{BusRecord, partition_for_key},
    error::{BusError, BusResult},
    ports::{BusConsumer, BusProducer},
};

/// Thread-safe in-memory broker.
///
/// Cloning yields another handle to the same broker.
///
/// # Example
///
/// ```
/// use lexbus::bus::adapters::memory::InMemoryBus;
///
/// let bus = InMemoryBus::with_partitions(4);
/// let consumer = bus.subscribe(&["docs.uploaded"], "parser-group");
/// assert!(consumer.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryBus {
    inner: Arc<BusInner>,
}

#[derive(Debug)]
struct BusInner {
    state: Mutex<BusState>,
    published: Notify,
    partitions: u32,
}

#[derive(Debug, Default)]
struct BusState {
    logs: HashMap<String, Vec<Vec<StoredRecord>>>,
    committed: HashMap<GroupPartition, u64>,
    next_sequence: u64,
    reject_publishes: bool,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    key: Option<String>,
    value: Vec<u8>,
    sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupPartition {
    group: String,
    topic: String,
    partition: u32,
}

impl GroupPartition {
    fn new(group: &str, topic: &str, partition: u32) -> Self {
        Self {
            group: group.to_owned(),
            topic: topic.to_owned(),
            partition,
        }
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBus {
    /// Partition count used by [`InMemoryBus::new`].
    pub const DEFAULT_PARTITIONS: u32 = 3;

    /// Creates a broker with the default partition count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitions(Self::DEFAULT_PARTITIONS)
    }

    /// Creates a broker whose topics have `partitions` partitions (at least one).
    #[must_use]
    pub fn with_partitions(partitions: u32) -> Self {
        Self {
            inner: Arc::new(BusInner {
                state: Mutex::new(BusState::default()),
                published: Notify::new(),
                partitions: partitions.max(1),
            }),
        }
    }

    /// Returns the number of partitions per topic.
    #[must_use]
    pub fn partitions(&self) -> u32 {
        self.inner.partitions
    }

    fn lock(&self) -> BusResult<MutexGuard<'_, BusState>> {
        self.inner
            .state
            .lock()
            .map_err(|err| BusError::runtime(std::io::Error::other(err.to_string())))
    }

    /// Makes subsequent publishes fail with [`BusError::Unavailable`].
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn set_reject_publishes(&self, reject: bool) -> BusResult<()> {
        self.lock()?.reject_publishes = reject;
        Ok(())
    }

    /// Appends pre-encoded bytes to a topic, bypassing payload checks.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn publish_raw(&self, topic: &str, key: Option<&str>, value: Vec<u8>) -> BusResult<()> {
        {
            let mut state = self.lock()?;
            let partition = key.map_or(0, |k| partition_for_key(k, self.inner.partitions));
            let sequence = state.next_sequence;
            state.next_sequence = sequence.saturating_add(1);
            let partitions = self.inner.partitions;
            let log = state
                .logs
                .entry(topic.to_owned())
                .or_insert_with(|| (0..partitions).map(|_| Vec::new()).collect());
            let slot = usize::try_from(partition)
                .ok()
                .and_then(|index| log.get_mut(index))
                .ok_or_else(|| BusError::UnassignedPartition {
                    topic: topic.to_owned(),
                    partition,
                })?;
            slot.push(StoredRecord {
                key: key.map(str::to_owned),
                value,
                sequence,
            });
        }
        self.inner.published.notify_waiters();
        Ok(())
    }

    /// Subscribes a consumer owning every partition of `topics`.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn subscribe(&self, topics: &[&str], group_id: &str) -> BusResult<InMemoryConsumer> {
        self.subscribe_member(topics, group_id, 0, 1)
    }

    /// Subscribes one member of a consumer group.
    ///
    /// Member `member` of `members` owns the partitions whose index modulo
    /// `members` equals `member`, so members of one group own disjoint
    /// partitions. Reading starts at the group's committed offsets.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn subscribe_member(
        &self,
        topics: &[&str],
        group_id: &str,
        member: u32,
        members: u32,
    ) -> BusResult<InMemoryConsumer> {
        let group_size = members.max(1);
        let state = self.lock()?;
        let assignments = topics
            .iter()
            .flat_map(|topic| {
                (0..self.inner.partitions)
                    .filter(move |partition| partition.checked_rem(group_size) == Some(member))
                    .map(move |partition| (*topic, partition))
            })
            .map(|(topic, partition)| Assignment {
                topic: topic.to_owned(),
                partition,
                position: state
                    .committed
                    .get(&GroupPartition::new(group_id, topic, partition))
                    .copied()
                    .unwrap_or(0),
            })
            .collect();
        drop(state);
        Ok(InMemoryConsumer {
            bus: self.clone(),
            group_id: group_id.to_owned(),
            assignments,
            cursor: 0,
        })
    }

    /// Returns every record of `topic` in publication order.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn records(&self, topic: &str) -> BusResult<Vec<BusRecord>> {
        let state = self.lock()?;
        let mut ordered: Vec<(u64, BusRecord)> = state
            .logs
            .get(topic)
            .into_iter()
            .flat_map(|partitions| partitions.iter().zip(0_u32..))
            .flat_map(|(log, partition)| {
                log.iter().zip(0_u64..).map(move |(stored, offset)| {
                    (
                        stored.sequence,
                        to_record(topic, partition, offset, stored),
                    )
                })
            })
            .collect();
        ordered.sort_by_key(|(sequence, _)| *sequence);
        Ok(ordered.into_iter().map(|(_, record)| record).collect())
    }

    /// Decodes every record of `topic` as JSON, skipping undecodable ones.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn values(&self, topic: &str) -> BusResult<Vec<Value>> {
        Ok(self
            .records(topic)?
            .into_iter()
            .filter_map(|record| serde_json::from_slice(&record.value).ok())
            .collect())
    }

    /// Returns the committed offset of a group on one partition.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn committed_offset(
        &self,
        group_id: &str,
        topic: &str,
        partition: u32,
    ) -> BusResult<Option<u64>> {
        let state = self.lock()?;
        Ok(state
            .committed
            .get(&GroupPartition::new(group_id, topic, partition))
            .copied())
    }
}

fn to_record(topic: &str, partition: u32, offset: u64, stored: &StoredRecord) -> BusRecord {
    BusRecord {
        topic: topic.to_owned(),
        partition,
        offset,
        key: stored.key.clone(),
        value: stored.value.clone(),
    }
}

#[async_trait]
impl BusProducer for InMemoryBus {
    async fn publish(&self, topic: &str, value: &Value, key: &str) -> BusResult<()> {
        if !value.is_object() {
            return Err(BusError::InvalidPayload(topic.to_owned()));
        }
        if self.lock()?.reject_publishes {
            return Err(BusError::unavailable("broker rejected publish"));
        }
        let bytes = serde_json::to_vec(value).map_err(|err| BusError::Encoding {
            topic: topic.to_owned(),
            reason: err.to_string(),
        })?;
        self.publish_raw(topic, Some(key), bytes)
    }
}

#[derive(Debug, Clone)]
struct Assignment {
    topic: String,
    partition: u32,
    position: u64,
}

/// Consumer handle returned by [`InMemoryBus::subscribe`].
#[derive(Debug)]
pub struct InMemoryConsumer {
    bus: InMemoryBus,
    group_id: String,
    assignments: Vec<Assignment>,
    cursor: usize,
}

impl InMemoryConsumer {
    /// Returns the consumer group this consumer commits for.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Returns the owned `(topic, partition)` pairs.
    #[must_use]
    pub fn assignments(&self) -> Vec<(String, u32)> {
        self.assignments
            .iter()
            .map(|assignment| (assignment.topic.clone(), assignment.partition))
            .collect()
    }

    fn next_available(&mut self) -> BusResult<Option<BusRecord>> {
        let state = self.bus.lock()?;
        let count = self.assignments.len();
        for step in 0..count {
            let index = self
                .cursor
                .saturating_add(step)
                .checked_rem(count)
                .unwrap_or(0);
            let Some(assignment) = self.assignments.get_mut(index) else {
                continue;
            };
            let stored = state
                .logs
                .get(&assignment.topic)
                .and_then(|partitions| partitions.get(usize::try_from(assignment.partition).ok()?))
                .and_then(|records| records.get(usize::try_from(assignment.position).ok()?));
            if let Some(stored) = stored {
                let record = to_record(
                    &assignment.topic,
                    assignment.partition,
                    assignment.position,
                    stored,
                );
                assignment.position = assignment.position.saturating_add(1);
                self.cursor = index.saturating_add(1);
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl BusConsumer for InMemoryConsumer {
    async fn poll(&mut self, timeout: Duration) -> BusResult<Option<BusRecord>> {
        let deadline = Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(Instant::now);
        let inner = Arc::clone(&self.bus.inner);
        loop {
            let notified = inner.published.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(record) = self.next_available()? {
                return Ok(Some(record));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::select! {
                () = notified.as_mut() => {}
                () = tokio::time::sleep_until(deadline) => {}
            }
        }
    }

    async fn commit(&mut self, record: &BusRecord) -> BusResult<()> {
        let mut state = self.bus.lock()?;
        let next = record.offset.saturating_add(1);
        let committed = state
            .committed
            .entry(GroupPartition::new(
                &self.group_id,
                &record.topic,
                record.partition,
            ))
            .or_insert(0);
        *committed = (*committed).max(next);
        Ok(())
    }

    async fn seek(&mut self, topic: &str, partition: u32, offset: u64) -> BusResult<()> {
        let assignment = self
            .assignments
            .iter_mut()
            .find(|assignment| assignment.topic == topic && assignment.partition == partition)
            .ok_or_else(|| BusError::UnassignedPartition {
                topic: topic.to_owned(),
                partition,
            })?;
        assignment.position = offset;
        Ok(())
    }
}
