//! Records as delivered by a consumer.

/// One record pulled from a topic partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusRecord {
    /// Topic the record was published to.
    pub topic: String,
    /// Partition within the topic.
    pub partition: u32,
    /// Offset within the partition.
    pub offset: u64,
    /// Partition key, if one was supplied.
    pub key: Option<String>,
    /// Canonical byte encoding of the value.
    pub value: Vec<u8>,
}

impl BusRecord {
    /// Returns the record's position.
    #[must_use]
    pub fn position(&self) -> RecordPosition {
        RecordPosition {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }
}

/// Topic, partition and offset identifying one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPosition {
    /// Topic name.
    pub topic: String,
    /// Partition index.
    pub partition: u32,
    /// Offset within the partition.
    pub offset: u64,
}
