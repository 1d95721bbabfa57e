//! Tests for envelope creation and validation.

use crate::envelope::{
    domain::{CorrelationId, Envelope, SessionId, UserId, validate_value},
    error::ValidationError,
};
use rstest::rstest;
use serde_json::{Value, json};

#[rstest]
fn create_generates_correlation_id_when_absent() {
    let first = Envelope::builder("parser", "docs.parsed")
        .build(json!({}))
        .expect("valid envelope");
    let second = Envelope::builder("parser", "docs.parsed")
        .build(json!({}))
        .expect("valid envelope");

    assert!(!first.correlation_id().as_str().is_empty());
    assert_ne!(first.correlation_id(), second.correlation_id());
}

#[rstest]
fn create_keeps_supplied_identity() {
    let correlation_id = CorrelationId::parse("corr-1").expect("non-empty id");
    let envelope = Envelope::builder("frontend", "user.message")
        .user_id(Some(UserId::new("u-1")))
        .session_id(Some(SessionId::new("s-1")))
        .correlation_id(correlation_id.clone())
        .build(json!({"text": "hi"}))
        .expect("valid envelope");

    assert_eq!(envelope.correlation_id(), &correlation_id);
    assert_eq!(envelope.user_id().map(UserId::as_str), Some("u-1"));
    assert_eq!(envelope.session_id().map(SessionId::as_str), Some("s-1"));
    assert_eq!(envelope.payload_str("text"), Some("hi"));
}

#[rstest]
#[case::string(json!("text"))]
#[case::number(json!(42))]
#[case::list(json!([1, 2]))]
#[case::null(Value::Null)]
fn create_rejects_non_mapping_payload(#[case] payload: Value) {
    let result = Envelope::builder("parser", "docs.parsed").build(payload);

    assert_eq!(result, Err(ValidationError::PayloadNotMapping));
}

#[rstest]
fn create_rejects_blank_event() {
    let result = Envelope::builder("parser", "  ").build(json!({}));

    assert_eq!(result, Err(ValidationError::EmptyField("event")));
}

#[rstest]
fn created_envelopes_pass_wire_validation() {
    let envelope = Envelope::builder("legal", "analysis.completed")
        .build(json!({"file_id": "f-1"}))
        .expect("valid envelope");

    assert_eq!(validate_value(&envelope.to_value()), Ok(()));
    assert_eq!(envelope.validate(), Ok(()));
}

#[rstest]
#[case::correlation("correlation_id")]
#[case::source("source")]
#[case::event("event")]
#[case::payload("payload")]
fn wire_validation_reports_missing_field(#[case] field: &'static str) {
    let mut raw = Envelope::builder("legal", "analysis.completed")
        .build(json!({}))
        .expect("valid envelope")
        .to_value();
    raw.as_object_mut().expect("object").remove(field);

    assert_eq!(
        validate_value(&raw),
        Err(ValidationError::MissingField(field))
    );
}

#[rstest]
fn wire_validation_rejects_list_payload() {
    let raw = json!({
        "correlation_id": "c",
        "source": "legal",
        "event": "analysis.completed",
        "payload": ["not", "a", "map"],
    });

    assert_eq!(validate_value(&raw), Err(ValidationError::PayloadNotMapping));
}

#[rstest]
fn wire_shape_renders_absent_identities_as_null() {
    let envelope = Envelope::builder("assistant", "chat.error")
        .build(json!({"reason": "boom"}))
        .expect("valid envelope");

    let raw = envelope.to_value();

    assert_eq!(raw.get("user_id"), Some(&Value::Null));
    assert_eq!(raw.get("session_id"), Some(&Value::Null));
    assert_eq!(raw.get("event"), Some(&json!("chat.error")));
}

#[rstest]
fn caused_by_propagates_identity() {
    let cause = Envelope::builder("frontend", "user.message")
        .user_id(Some(UserId::new("u-9")))
        .session_id(Some(SessionId::new("s-9")))
        .build(json!({"text": "q"}))
        .expect("valid envelope");

    let effect = Envelope::builder("assistant", "legal.followup.requested")
        .caused_by(&cause)
        .build(json!({}))
        .expect("valid envelope");

    assert_eq!(effect.correlation_id(), cause.correlation_id());
    assert_eq!(effect.user_id(), cause.user_id());
    assert_eq!(effect.session_id(), cause.session_id());
    assert_eq!(effect.source(), "assistant");
}

#[rstest]
#[case::blank("")]
#[case::whitespace("  \t")]
fn payload_str_ignores_blank_strings(#[case] text: &str) {
    let envelope = Envelope::builder("gateway", "user.message")
        .build(json!({"text": text, "count": 3}))
        .expect("valid envelope");

    assert_eq!(envelope.payload_str("text"), None);
    assert_eq!(envelope.payload_str("count"), None);
}
