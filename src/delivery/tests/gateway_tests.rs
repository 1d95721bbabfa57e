//! Tests for chat and upload ingress.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::support::user;
use crate::bus::{adapters::memory::InMemoryBus, services::EnvelopePublisher};
use crate::delivery::{
    adapters::memory::InMemoryChatHistory,
    domain::{Direction, UploadNotice},
    error::GatewayError,
    ports::ChatHistoryRepository,
    services::{ChatGateway, GATEWAY_SOURCE},
};
use crate::envelope::{Envelope, SessionId, topics, unwrap_or_adapt};
use crate::test_support::ManualClock;

struct Harness {
    bus: InMemoryBus,
    history: InMemoryChatHistory,
    gateway: ChatGateway<ManualClock>,
}

impl Harness {
    fn published(&self, topic: &str) -> Vec<Envelope> {
        self.bus
            .values(topic)
            .expect("bus readable")
            .into_iter()
            .map(|value| unwrap_or_adapt(value).expect("valid envelope").0)
            .collect()
    }
}

#[fixture]
fn harness() -> Harness {
    let bus = InMemoryBus::with_partitions(1);
    let history = InMemoryChatHistory::new();
    let gateway = ChatGateway::new(
        EnvelopePublisher::new(Arc::new(bus.clone())),
        Arc::new(history.clone()),
        Arc::new(ManualClock::new()),
    );
    Harness {
        bus,
        history,
        gateway,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inbound_messages_become_user_message_events(harness: Harness) {
    let envelope = harness
        .gateway
        .handle_inbound(
            &user(),
            &json!({ "message": { "text": "hello", "documents": ["f-1"], "session_id": "s-1" } }),
        )
        .await
        .expect("accepted");

    let published = harness.published(topics::USER_MESSAGE);
    assert_eq!(published, vec![envelope.clone()]);
    assert_eq!(envelope.source(), GATEWAY_SOURCE);
    assert_eq!(envelope.event(), topics::USER_MESSAGE);
    assert_eq!(envelope.user_id(), Some(&user()));
    assert_eq!(envelope.session_id(), Some(&SessionId::new("s-1")));
    assert_eq!(envelope.payload_str("text"), Some("hello"));
    assert_eq!(envelope.payload().get("documents"), Some(&json!(["f-1"])));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inbound_messages_are_recorded_as_user_history(harness: Harness) {
    let envelope = harness
        .gateway
        .handle_inbound(&user(), &json!({ "message": { "text": "hello" } }))
        .await
        .expect("accepted");

    let entries = harness
        .history
        .list_for_user(&user())
        .await
        .expect("readable");
    let entry = entries.first().expect("one entry");
    assert_eq!(entry.direction(), Direction::User);
    assert_eq!(entry.text(), Some("hello"));
    assert_eq!(entry.correlation_id(), Some(envelope.correlation_id()));
    assert!(envelope.payload().get("documents").is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn frames_without_a_message_publish_nothing(harness: Harness) {
    let result = harness
        .gateway
        .handle_inbound(&user(), &json!({ "text": "hello" }))
        .await;

    assert!(matches!(result, Err(GatewayError::MissingMessage)));
    assert!(harness.published(topics::USER_MESSAGE).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bus_outages_surface_as_publish_errors(harness: Harness) {
    harness.bus.set_reject_publishes(true).expect("toggle");

    let result = harness
        .gateway
        .handle_inbound(&user(), &json!({ "message": { "text": "hello" } }))
        .await;

    assert!(matches!(result, Err(GatewayError::Publish(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn history_outages_do_not_block_ingress(harness: Harness) {
    harness.history.set_unavailable(true);

    harness
        .gateway
        .handle_inbound(&user(), &json!({ "message": { "text": "hello" } }))
        .await
        .expect("accepted");

    assert_eq!(harness.published(topics::USER_MESSAGE).len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uploads_are_announced_with_a_default_file_id(harness: Harness) {
    let envelope = harness
        .gateway
        .notify_upload(
            Some(user()),
            Some(SessionId::new("s-1")),
            &UploadNotice::new("uploads", "obj-7"),
        )
        .await
        .expect("announced");

    assert_eq!(harness.published(topics::DOCS_UPLOADED), vec![envelope.clone()]);
    assert_eq!(envelope.payload_str("bucket"), Some("uploads"));
    assert_eq!(envelope.payload_str("object_id"), Some("obj-7"));
    assert_eq!(envelope.payload_str("file_id"), Some("obj-7"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uploads_keep_an_explicit_file_id(harness: Harness) {
    let envelope = harness
        .gateway
        .notify_upload(None, None, &UploadNotice::new("uploads", "obj-7").with_file_id("contract"))
        .await
        .expect("announced");

    assert_eq!(envelope.payload_str("file_id"), Some("contract"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uploads_require_a_bucket(harness: Harness) {
    let result = harness
        .gateway
        .notify_upload(None, None, &UploadNotice::new(" ", "obj-7"))
        .await;

    assert!(matches!(result, Err(GatewayError::MissingUploadField("bucket"))));
}
