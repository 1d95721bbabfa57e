//! Tests for the assistant agent.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::support::{Harness, MockModel, incoming, session};
use crate::agent::{
    error::AgentError,
    ports::{LlmError, LlmResponse},
    services::{Agent, AssistantAgent},
};
use crate::envelope::{ValidationError, topics};
use crate::session::domain::{BlobKey, FileId, TextScope};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn replying(text: impl Into<String>, times: usize) -> MockModel {
    let reply = text.into();
    let mut model = MockModel::new();
    model
        .expect_complete()
        .times(times)
        .returning(move |_| Ok(LlmResponse::from_text(reply.clone())));
    model
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn messages_without_documents_are_answered_directly(harness: Harness) {
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(replying("Hello!", 1)));
    let envelope = incoming(topics::USER_MESSAGE, json!({"text": "hello"}));

    agent
        .handle(topics::USER_MESSAGE, &envelope)
        .await
        .expect("handled");

    let reply = harness.single_event(topics::ASSISTANT_RESPONSE);
    assert_eq!(reply.event(), topics::ASSISTANT_REPLY_COMPLETED);
    assert_eq!(reply.correlation_id().as_str(), "corr-1");
    assert_eq!(reply.user_id().map(|user| user.as_str()), Some("u-1"));
    assert_eq!(reply.payload_str("text"), Some("Hello!"));
    let key = reply.payload_str("reply_key").expect("stored reply");
    assert_eq!(
        harness.documents().get_text(&BlobKey::new(key)).await.as_deref(),
        Some("Hello!")
    );
    assert!(harness.events(topics::LEGAL_FOLLOWUP_REQUESTED).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prompts_carry_a_bounded_snippet(harness: Harness) {
    let snippet_line = format!("User: {}", "z".repeat(1000));
    let mut model = MockModel::new();
    model
        .expect_complete()
        .withf(move |request| {
            request.prompt.ends_with(&snippet_line) && request.max_tokens == 800
        })
        .times(1)
        .returning(|_| Ok(LlmResponse::from_text("ok")));
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(model));
    let envelope = incoming(topics::USER_MESSAGE, json!({"text": "z".repeat(1500)}));

    agent
        .handle(topics::USER_MESSAGE, &envelope)
        .await
        .expect("handled");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_documents_route_messages_to_legal(harness: Harness) {
    harness
        .documents()
        .add_active_document(&session(), &FileId::new("f-1"))
        .await;
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(replying("unused", 0)));
    let envelope = incoming(topics::USER_MESSAGE, json!({"text": "what about clause 2?"}));

    agent
        .handle(topics::USER_MESSAGE, &envelope)
        .await
        .expect("handled");

    let delegated = harness.single_event(topics::LEGAL_FOLLOWUP_REQUESTED);
    assert_eq!(delegated.correlation_id().as_str(), "corr-1");
    assert_eq!(delegated.payload_str("query"), Some("what about clause 2?"));
    assert_eq!(delegated.session_id(), Some(&session()));
    assert!(harness.events(topics::ASSISTANT_RESPONSE).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exhausted_model_reports_a_chat_error(harness: Harness) {
    let mut model = MockModel::new();
    model
        .expect_complete()
        .times(3)
        .returning(|_| Err(LlmError::Request("timeout".to_owned())));
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(model));
    let envelope = incoming(topics::USER_MESSAGE, json!({"text": "hello"}));

    agent
        .handle(topics::USER_MESSAGE, &envelope)
        .await
        .expect("upstream failure is not an error");

    let error = harness.single_event(topics::CHAT_ERROR);
    assert!(error.payload_str("reason").expect("reason").contains("timeout"));
    assert!(harness.events(topics::ASSISTANT_RESPONSE).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storage_failure_falls_back_to_truncated_reply(harness: Harness) {
    let agent = AssistantAgent::new(
        harness.context.clone(),
        Arc::new(replying("r".repeat(2500), 1)),
    );
    harness.store.set_unavailable(true);
    let envelope = incoming(topics::USER_MESSAGE, json!({"text": "hello"}));

    agent
        .handle(topics::USER_MESSAGE, &envelope)
        .await
        .expect("handled");

    let reply = harness.single_event(topics::ASSISTANT_RESPONSE);
    assert_eq!(reply.payload_str("text").map(str::len), Some(2000));
    assert_eq!(reply.payload().get("reply_key"), Some(&json!(null)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn draft_review_routes_replies_to_the_validator(harness: Harness) {
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(replying("A reply", 1)))
        .with_draft_review(true);
    let envelope = incoming(topics::USER_MESSAGE, json!({"text": "hello"}));

    agent
        .handle(topics::USER_MESSAGE, &envelope)
        .await
        .expect("handled");

    let draft = harness.single_event(topics::DRAFT_CREATED);
    assert_eq!(draft.payload_str("draft"), Some("A reply"));
    assert!(harness.events(topics::ASSISTANT_RESPONSE).is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_messages_are_invalid(harness: Harness) {
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(replying("unused", 0)));
    let envelope = incoming(topics::USER_MESSAGE, json!({"text": "  "}));

    let result = agent.handle(topics::USER_MESSAGE, &envelope).await;

    assert!(matches!(
        result,
        Err(AgentError::Validation(ValidationError::EmptyField("text")))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn analyses_are_formatted_into_replies(harness: Harness) {
    let key = harness
        .documents()
        .save_text(
            &TextScope::Analysis {
                session_id: Some(session()),
                file_id: FileId::new("f-1"),
            },
            "Low risk overall.",
        )
        .await
        .expect("save");
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(replying("unused", 0)));
    let envelope = incoming(
        topics::ANALYSIS_COMPLETED,
        json!({"file_id": "f-1", "analysis_key": key.as_str()}),
    );

    agent
        .handle(topics::ANALYSIS_COMPLETED, &envelope)
        .await
        .expect("handled");

    let reply = harness.single_event(topics::ASSISTANT_RESPONSE);
    let text = reply.payload_str("text").expect("text");
    assert!(text.starts_with("Here is what I found:"));
    assert!(text.contains("Low risk overall."));
    assert_eq!(reply.payload_str("analysis_key"), Some(key.as_str()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_analysis_is_a_not_found_skip(harness: Harness) {
    let agent = AssistantAgent::new(harness.context.clone(), Arc::new(replying("unused", 0)));
    let envelope = incoming(
        topics::ANALYSIS_COMPLETED,
        json!({"analysis_key": "analysis:s-1:f-1:gone"}),
    );

    let result = agent.handle(topics::ANALYSIS_COMPLETED, &envelope).await;

    assert!(matches!(result, Err(AgentError::NotFound(_))));
    assert!(harness.events(topics::ASSISTANT_RESPONSE).is_empty());
}
