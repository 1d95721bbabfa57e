//! Parser agent: uploaded object to extracted text.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::agent::{
    domain::{AgentKind, truncate_chars},
    error::{AgentError, AgentResult},
    ports::{DocumentKind, ObjectRef, ObjectStore, TextExtractor},
    services::{Agent, AgentContext, context::payload_of},
};
use crate::envelope::{Envelope, SessionId, ValidationError, domain::Payload, topics};
use crate::session::domain::{DocumentArtifact, FileId, TextScope};

/// Fetches uploaded objects, extracts their text and announces it.
///
/// Handles `docs.uploaded` and publishes `docs.parsed`,
/// `docs.upload.failed` or `docs.parse.failed`.
pub struct ParserAgent {
    context: AgentContext,
    objects: Arc<dyn ObjectStore>,
    extractor: Arc<dyn TextExtractor>,
}

struct Upload {
    object: ObjectRef,
    file_id: FileId,
    session_id: Option<SessionId>,
}

impl ParserAgent {
    /// Creates the agent.
    #[must_use]
    pub fn new(
        context: AgentContext,
        objects: Arc<dyn ObjectStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            context,
            objects,
            extractor,
        }
    }

    fn upload_from(envelope: &Envelope) -> AgentResult<Upload> {
        let bucket = envelope
            .payload_str("bucket")
            .ok_or(ValidationError::MissingField("bucket"))?;
        let object_id = envelope
            .payload_str("object_id")
            .ok_or(ValidationError::MissingField("object_id"))?;
        let file_id = FileId::new(envelope.payload_str("file_id").unwrap_or(object_id));
        let session_id = envelope
            .session_id()
            .cloned()
            .or_else(|| envelope.payload_str("session_id").map(SessionId::new));
        Ok(Upload {
            object: ObjectRef::new(bucket, object_id),
            file_id,
            session_id,
        })
    }

    async fn already_parsed(&self, upload: &Upload) -> bool {
        let Some(session_id) = upload.session_id.as_ref() else {
            return false;
        };
        match self
            .context
            .documents()
            .is_active(session_id, &upload.file_id)
            .await
        {
            Ok(active) => active,
            Err(err) => {
                tracing::warn!(
                    file_id = %upload.file_id,
                    error = %err,
                    "duplicate check failed"
                );
                false
            }
        }
    }

    async fn extract(&self, bytes: &[u8], file_id: &FileId) -> Result<String, String> {
        let kind = DocumentKind::detect(bytes);
        tracing::debug!(file_id = %file_id, ?kind, "extracting text");
        match self.extractor.extract(kind, bytes).await {
            Ok(text) => Ok(text),
            Err(first) if kind != DocumentKind::Image => {
                tracing::warn!(
                    file_id = %file_id,
                    error = %first,
                    "extraction failed; retrying as image"
                );
                self.extractor
                    .extract(DocumentKind::Image, bytes)
                    .await
                    .map_err(|err| err.to_string())
            }
            Err(err) => Err(err.to_string()),
        }
    }

    async fn parse_upload(&self, envelope: &Envelope) -> AgentResult<()> {
        let upload = Self::upload_from(envelope)?;
        if self.already_parsed(&upload).await {
            tracing::info!(
                file_id = %upload.file_id,
                "document already parsed for session; skipping"
            );
            return Ok(());
        }

        let objects = &self.objects;
        let object = &upload.object;
        let fetched = self
            .context
            .retry()
            .run("object fetch", move || objects.fetch(object))
            .await;
        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(AgentError::UpstreamUnavailable { reason, .. }) => {
                let payload = payload_of(json!({
                    "file_id": upload.file_id.as_str(),
                    "bucket": upload.object.bucket,
                    "object_id": upload.object.object_id,
                    "reason": reason,
                }));
                self.context
                    .emit(
                        AgentKind::Parser,
                        envelope,
                        topics::DOCS_UPLOAD_FAILED,
                        payload,
                    )
                    .await?;
                return Ok(());
            }
            Err(other) => return Err(other),
        };

        let text = match self.extract(&bytes, &upload.file_id).await {
            Ok(text) => text,
            Err(reason) => {
                let payload = payload_of(json!({
                    "file_id": upload.file_id.as_str(),
                    "reason": reason,
                }));
                self.context
                    .emit(
                        AgentKind::Parser,
                        envelope,
                        topics::DOCS_PARSE_FAILED,
                        payload,
                    )
                    .await?;
                return Ok(());
            }
        };

        let (payload, stored) = self.store_text(&upload, &text).await;
        self.context
            .emit(AgentKind::Parser, envelope, topics::DOCS_PARSED, payload)
            .await?;
        // Only announced documents count as parsed, so a failed publish is
        // parsed again on redelivery.
        if stored && let Some(session_id) = upload.session_id.as_ref() {
            self.context
                .documents()
                .add_active_document(session_id, &upload.file_id)
                .await;
        }
        Ok(())
    }

    /// Stores the text and builds the `docs.parsed` payload.
    ///
    /// The flag reports whether the text was stored by key.
    async fn store_text(&self, upload: &Upload, text: &str) -> (Payload, bool) {
        let scope = TextScope::DocumentText {
            session_id: upload.session_id.clone(),
            file_id: upload.file_id.clone(),
        };
        let mut payload = payload_of(json!({ "file_id": upload.file_id.as_str() }));
        let documents = self.context.documents();
        match documents.save_text(&scope, text).await {
            Ok(key) => {
                if let Some(session_id) = upload.session_id.as_ref()
                    && let Err(err) = documents
                        .link_artifact(session_id, &upload.file_id, DocumentArtifact::Text, &key)
                        .await
                {
                    tracing::warn!(
                        file_id = %upload.file_id,
                        error = %err,
                        "failed to link text pointer"
                    );
                }
                payload.insert("text_key".to_owned(), Value::from(key.as_str()));
                (payload, true)
            }
            Err(err) => {
                let limit = self.context.limits().parser_fallback_limit;
                tracing::warn!(
                    file_id = %upload.file_id,
                    error = %err,
                    limit,
                    "storing parsed text failed; publishing inline"
                );
                payload.insert("text".to_owned(), Value::from(truncate_chars(text, limit)));
                payload.insert(
                    "truncated".to_owned(),
                    Value::Bool(text.chars().count() > limit),
                );
                (payload, false)
            }
        }
    }
}

#[async_trait]
impl Agent for ParserAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Parser
    }

    async fn handle(&self, event: &str, envelope: &Envelope) -> AgentResult<()> {
        match event {
            topics::DOCS_UPLOADED => self.parse_upload(envelope).await,
            other => Err(AgentError::UnknownEvent(other.to_owned())),
        }
    }
}
