//! Tests for consume loop commit and redelivery semantics.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::watch;

use crate::bus::{
    adapters::memory::{InMemoryBus, InMemoryConsumer},
    ports::{BusProducer, HandlerError, RecordHandler},
    services::{ConsumeLoop, ConsumeSettings, RecordDisposition},
};
use rstest::{fixture, rstest};

const TOPIC: &str = "docs.uploaded";
const GROUP: &str = "parser";

/// Handler failing a fixed number of times before succeeding.
#[derive(Default)]
struct FlakyHandler {
    failures_left: Mutex<u32>,
    handled: Mutex<Vec<Value>>,
}

impl FlakyHandler {
    fn failing(times: u32) -> Self {
        Self {
            failures_left: Mutex::new(times),
            handled: Mutex::new(Vec::new()),
        }
    }

    fn handled(&self) -> Vec<Value> {
        self.handled.lock().expect("handled lock").clone()
    }
}

#[async_trait]
impl RecordHandler for FlakyHandler {
    async fn handle(
        &self,
        _topic: &str,
        payload: Value,
        _key: Option<&str>,
    ) -> Result<(), HandlerError> {
        let mut left = self.failures_left.lock().expect("failure lock");
        if *left > 0 {
            *left -= 1;
            return Err(HandlerError::new("transient"));
        }
        self.handled.lock().expect("handled lock").push(payload);
        Ok(())
    }
}

#[fixture]
fn bus() -> InMemoryBus {
    InMemoryBus::with_partitions(1)
}

fn settings(max_redeliveries: u32) -> ConsumeSettings {
    ConsumeSettings {
        poll_timeout: Duration::from_millis(50),
        max_redeliveries,
    }
}

fn consume_loop(bus: &InMemoryBus, max_redeliveries: u32) -> ConsumeLoop<InMemoryConsumer> {
    let consumer = bus.subscribe(&[TOPIC], GROUP).expect("subscribe");
    ConsumeLoop::new("parser", consumer, settings(max_redeliveries))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_handling_commits(bus: InMemoryBus) {
    bus.publish(TOPIC, &json!({"file_id": "f"}), "c")
        .await
        .expect("publish");
    let handler = FlakyHandler::failing(0);
    let mut subject = consume_loop(&bus, 5);

    let outcome = subject.step(&handler).await.expect("step");

    assert_eq!(outcome, Some(RecordDisposition::Committed));
    assert_eq!(handler.handled(), vec![json!({"file_id": "f"})]);
    assert_eq!(bus.committed_offset(GROUP, TOPIC, 0).expect("offset"), Some(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_poll_reports_nothing(bus: InMemoryBus) {
    let handler = FlakyHandler::failing(0);
    let mut subject = consume_loop(&bus, 5);

    assert_eq!(subject.step(&handler).await.expect("step"), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_records_are_skipped_and_committed(bus: InMemoryBus) {
    bus.publish_raw(TOPIC, Some("c"), b"not json".to_vec())
        .expect("raw publish");
    bus.publish(TOPIC, &json!({"file_id": "next"}), "c")
        .await
        .expect("publish");
    let handler = FlakyHandler::failing(0);
    let mut subject = consume_loop(&bus, 5);

    let first = subject.step(&handler).await.expect("step");
    let second = subject.step(&handler).await.expect("step");

    assert_eq!(first, Some(RecordDisposition::SkippedMalformed));
    assert_eq!(second, Some(RecordDisposition::Committed));
    assert_eq!(handler.handled(), vec![json!({"file_id": "next"})]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn handler_failure_redelivers_the_same_record(bus: InMemoryBus) {
    bus.publish(TOPIC, &json!({"n": 1}), "c").await.expect("publish");
    bus.publish(TOPIC, &json!({"n": 2}), "c").await.expect("publish");
    let handler = FlakyHandler::failing(2);
    let mut subject = consume_loop(&bus, 5);

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(subject.step(&handler).await.expect("step"));
    }

    assert_eq!(
        outcomes,
        vec![
            Some(RecordDisposition::Redelivering { attempt: 1 }),
            Some(RecordDisposition::Redelivering { attempt: 2 }),
            Some(RecordDisposition::Committed),
            Some(RecordDisposition::Committed),
        ]
    );
    assert_eq!(handler.handled(), vec![json!({"n": 1}), json!({"n": 2})]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_record_is_not_committed(bus: InMemoryBus) {
    bus.publish(TOPIC, &json!({"n": 1}), "c").await.expect("publish");
    let handler = FlakyHandler::failing(1);
    let mut subject = consume_loop(&bus, 5);

    subject.step(&handler).await.expect("step");

    assert_eq!(bus.committed_offset(GROUP, TOPIC, 0).expect("offset"), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn record_is_skipped_after_max_redeliveries(bus: InMemoryBus) {
    bus.publish(TOPIC, &json!({"n": 1}), "c").await.expect("publish");
    let handler = FlakyHandler::failing(u32::MAX);
    let mut subject = consume_loop(&bus, 2);

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        outcomes.push(subject.step(&handler).await.expect("step"));
    }

    assert_eq!(
        outcomes.last(),
        Some(&Some(RecordDisposition::SkippedAfterRedeliveries))
    );
    assert_eq!(bus.committed_offset(GROUP, TOPIC, 0).expect("offset"), Some(1));
    assert_eq!(subject.step(&handler).await.expect("step"), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_stops_when_shutdown_is_signalled(bus: InMemoryBus) {
    bus.publish(TOPIC, &json!({"n": 1}), "c").await.expect("publish");
    let handler = std::sync::Arc::new(FlakyHandler::failing(0));
    let subject = consume_loop(&bus, 5);
    let (stop, stopped) = watch::channel(false);

    let worker = {
        let task_handler = std::sync::Arc::clone(&handler);
        tokio::spawn(async move { subject.run(task_handler.as_ref(), stopped).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    stop.send(true).expect("loop is listening");

    let result = tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .expect("loop stops in time")
        .expect("task joins");

    assert!(result.is_ok());
    assert_eq!(handler.handled(), vec![json!({"n": 1})]);
}
