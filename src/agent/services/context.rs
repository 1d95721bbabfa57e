//! Collaborators shared by every agent.

use serde_json::Value;
use std::sync::Arc;

use crate::agent::{
    domain::{AgentKind, AgentLimits, truncate_chars},
    error::AgentResult,
    services::{PromptCatalog, RetryExecutor},
};
use crate::bus::services::EnvelopePublisher;
use crate::envelope::{Envelope, domain::Payload};
use crate::session::{
    domain::{BlobKey, TextScope},
    services::SessionDocumentStore,
};

/// Converts a JSON object literal into a payload; other values yield an
/// empty payload.
pub(super) fn payload_of(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// A text result after an attempt to store it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResult {
    /// Key of the stored text; `None` when storing failed.
    pub key: Option<BlobKey>,
    /// Text to carry inline, bounded by the applicable limit.
    pub text: String,
    /// Whether `text` is shorter than the full result.
    pub truncated: bool,
}

impl StoredResult {
    /// Writes the key (or `null`) and the inline text into `payload`.
    pub fn write_into(&self, payload: &mut Payload, key_field: &str, text_field: &str) {
        payload.insert(
            key_field.to_owned(),
            self.key
                .as_ref()
                .map_or(Value::Null, |key| Value::from(key.as_str())),
        );
        payload.insert(text_field.to_owned(), Value::from(self.text.clone()));
        if self.truncated {
            payload.insert("truncated".to_owned(), Value::Bool(true));
        }
    }
}

/// Publisher, session store, retry executor, prompts and limits.
#[derive(Debug, Clone)]
pub struct AgentContext {
    publisher: EnvelopePublisher,
    documents: SessionDocumentStore,
    retry: RetryExecutor,
    prompts: Arc<PromptCatalog>,
    limits: AgentLimits,
}

impl AgentContext {
    /// Creates a context with default limits.
    #[must_use]
    pub fn new(
        publisher: EnvelopePublisher,
        documents: SessionDocumentStore,
        retry: RetryExecutor,
        prompts: Arc<PromptCatalog>,
    ) -> Self {
        Self {
            publisher,
            documents,
            retry,
            prompts,
            limits: AgentLimits::default(),
        }
    }

    /// Replaces the output limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: AgentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the session document store.
    #[must_use]
    pub const fn documents(&self) -> &SessionDocumentStore {
        &self.documents
    }

    /// Returns the retry executor.
    #[must_use]
    pub const fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    /// Returns the prompt catalogue.
    #[must_use]
    pub fn prompts(&self) -> &PromptCatalog {
        &self.prompts
    }

    /// Returns the output limits.
    #[must_use]
    pub const fn limits(&self) -> &AgentLimits {
        &self.limits
    }

    /// Publishes `payload` as an event caused by `cause`, using the topic as
    /// the event name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::error::AgentError::Publish`] when the bus
    /// rejects the event.
    pub async fn emit(
        &self,
        kind: AgentKind,
        cause: &Envelope,
        topic: &str,
        payload: Payload,
    ) -> AgentResult<Envelope> {
        self.emit_event(kind, cause, topic, topic, payload).await
    }

    /// Publishes `payload` on `topic` with an explicit event name.
    ///
    /// The new envelope inherits user, session and correlation identity
    /// from `cause`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::agent::error::AgentError::Publish`] when the bus
    /// rejects the event.
    pub async fn emit_event(
        &self,
        kind: AgentKind,
        cause: &Envelope,
        topic: &str,
        event: &str,
        payload: Payload,
    ) -> AgentResult<Envelope> {
        let envelope = Envelope::builder(kind.source(), event)
            .caused_by(cause)
            .build_with(payload)?;
        self.publisher.publish(topic, &envelope).await?;
        tracing::info!(
            agent = %kind,
            topic,
            event,
            correlation_id = %envelope.correlation_id(),
            "emitted downstream event"
        );
        Ok(envelope)
    }

    /// Stores `content` in `scope`, degrading to inline text on failure.
    ///
    /// A stored result keeps up to `inline_limit` characters inline; an
    /// unstored one keeps up to `fallback_limit` characters.
    pub async fn store_or_inline(
        &self,
        scope: &TextScope,
        content: &str,
        fallback_limit: usize,
    ) -> StoredResult {
        let length = content.chars().count();
        match self.documents.save_text(scope, content).await {
            Ok(key) => StoredResult {
                key: Some(key),
                text: truncate_chars(content, self.limits.inline_limit),
                truncated: length > self.limits.inline_limit,
            },
            Err(err) => {
                tracing::warn!(
                    scope = scope.prefix(),
                    error = %err,
                    "storing result failed; publishing truncated inline text"
                );
                StoredResult {
                    key: None,
                    text: truncate_chars(content, fallback_limit),
                    truncated: length > fallback_limit,
                }
            }
        }
    }
}
