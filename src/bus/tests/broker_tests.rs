//! Tests for the in-memory broker and the envelope publisher.

use std::sync::Arc;
use std::time::Duration;

use crate::bus::{
    adapters::memory::InMemoryBus,
    domain::partition_for_key,
    error::BusError,
    ports::{BusConsumer, BusProducer},
    services::EnvelopePublisher,
};
use crate::envelope::Envelope;
use rstest::{fixture, rstest};
use serde_json::json;

const POLL: Duration = Duration::from_millis(50);

#[fixture]
fn bus() -> InMemoryBus {
    InMemoryBus::with_partitions(4)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn records_with_one_key_keep_their_order(bus: InMemoryBus) {
    for index in 0..5 {
        bus.publish("docs.parsed", &json!({"n": index}), "corr-1")
            .await
            .expect("publish succeeds");
    }
    let mut consumer = bus.subscribe(&["docs.parsed"], "legal").expect("subscribe");

    let mut seen = Vec::new();
    while let Some(record) = consumer.poll(POLL).await.expect("poll succeeds") {
        assert_eq!(record.partition, partition_for_key("corr-1", 4));
        assert_eq!(record.key.as_deref(), Some("corr-1"));
        let value: serde_json::Value =
            serde_json::from_slice(&record.value).expect("valid json");
        seen.push(value["n"].clone());
    }

    assert_eq!(seen, vec![json!(0), json!(1), json!(2), json!(3), json!(4)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_rejects_non_mapping_values(bus: InMemoryBus) {
    let result = bus.publish("docs.parsed", &json!([1, 2]), "k").await;

    assert!(matches!(result, Err(BusError::InvalidPayload(topic)) if topic == "docs.parsed"));
    assert!(bus.records("docs.parsed").expect("records").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn publish_fails_while_broker_rejects(bus: InMemoryBus) {
    bus.set_reject_publishes(true).expect("toggle");

    let result = bus.publish("chat.error", &json!({}), "k").await;

    assert!(matches!(result, Err(BusError::Unavailable(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uncommitted_records_are_redelivered_to_the_group(bus: InMemoryBus) {
    bus.publish("user.message", &json!({"n": 1}), "a")
        .await
        .expect("publish");
    bus.publish("user.message", &json!({"n": 2}), "a")
        .await
        .expect("publish");

    let mut first = bus.subscribe(&["user.message"], "assistant").expect("subscribe");
    let committed = first.poll(POLL).await.expect("poll").expect("first record");
    first.commit(&committed).await.expect("commit");
    let uncommitted = first.poll(POLL).await.expect("poll").expect("second record");
    drop(first);

    let mut restarted = bus.subscribe(&["user.message"], "assistant").expect("subscribe");
    let redelivered = restarted.poll(POLL).await.expect("poll").expect("redelivery");

    assert_eq!(redelivered.offset, uncommitted.offset);
    assert_eq!(
        bus.committed_offset("assistant", "user.message", committed.partition)
            .expect("offset"),
        Some(committed.offset + 1)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn groups_consume_independently(bus: InMemoryBus) {
    bus.publish("analysis.completed", &json!({}), "c")
        .await
        .expect("publish");

    let mut assistant = bus
        .subscribe(&["analysis.completed"], "assistant")
        .expect("subscribe");
    let mut bridge = bus
        .subscribe(&["analysis.completed"], "bridge")
        .expect("subscribe");

    assert!(assistant.poll(POLL).await.expect("poll").is_some());
    assert!(bridge.poll(POLL).await.expect("poll").is_some());
}

#[rstest]
fn group_members_own_disjoint_partitions(bus: InMemoryBus) {
    let first = bus
        .subscribe_member(&["docs.uploaded"], "parser", 0, 2)
        .expect("subscribe");
    let second = bus
        .subscribe_member(&["docs.uploaded"], "parser", 1, 2)
        .expect("subscribe");

    let mut owned: Vec<u32> = first
        .assignments()
        .into_iter()
        .chain(second.assignments())
        .map(|(_, partition)| partition)
        .collect();
    owned.sort_unstable();

    assert_eq!(owned, vec![0, 1, 2, 3]);
    assert!(
        first
            .assignments()
            .iter()
            .all(|assignment| !second.assignments().contains(assignment))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn poll_times_out_without_records(bus: InMemoryBus) {
    let mut consumer = bus.subscribe(&["draft.created"], "validator").expect("subscribe");

    let record = consumer
        .poll(Duration::from_millis(20))
        .await
        .expect("poll succeeds");

    assert!(record.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn poll_wakes_on_publish(bus: InMemoryBus) {
    let mut consumer = bus.subscribe(&["draft.created"], "validator").expect("subscribe");
    let producer = bus.clone();
    let publish = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        producer
            .publish("draft.created", &json!({"draft": "x"}), "k")
            .await
    });

    let record = consumer
        .poll(Duration::from_secs(5))
        .await
        .expect("poll succeeds");

    assert!(record.is_some());
    publish
        .await
        .expect("task joins")
        .expect("publish succeeds");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn seek_rejects_foreign_partitions(bus: InMemoryBus) {
    let mut consumer = bus
        .subscribe_member(&["docs.uploaded"], "parser", 0, 2)
        .expect("subscribe");

    let result = consumer.seek("docs.uploaded", 1, 0).await;

    assert!(matches!(
        result,
        Err(BusError::UnassignedPartition { partition: 1, .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn envelope_publisher_keys_by_correlation_id(bus: InMemoryBus) {
    let publisher = EnvelopePublisher::new(Arc::new(bus.clone()));
    let envelope = Envelope::builder("parser", "docs.parsed")
        .build(json!({"file_id": "f-1"}))
        .expect("valid envelope");

    publisher
        .publish("docs.parsed", &envelope)
        .await
        .expect("publish succeeds");

    let records = bus.records("docs.parsed").expect("records");
    assert_eq!(records.len(), 1);
    let record = records.first().expect("one record");
    assert_eq!(
        record.key.as_deref(),
        Some(envelope.correlation_id().as_str())
    );
    let decoded: serde_json::Value = serde_json::from_slice(&record.value).expect("json");
    assert_eq!(decoded, envelope.to_value());
}
