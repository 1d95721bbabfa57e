//! Legal agent: document analysis and follow-up answers.

use async_trait::async_trait;
use minijinja::context;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::agent::{
    domain::{AgentKind, truncate_chars},
    error::{AgentError, AgentResult},
    ports::{LanguageModel, LlmRequest},
    services::{Agent, AgentContext, context::payload_of},
};
use crate::envelope::{Envelope, ValidationError, topics};
use crate::session::domain::{BlobKey, DocumentArtifact, FileId, TextScope};

/// Placeholder used when a parsed document names no file.
const UNKNOWN_FILE: &str = "unknown_file";

/// Analyses parsed documents and answers questions about active documents.
pub struct LegalAgent {
    context: AgentContext,
    model: Arc<dyn LanguageModel>,
}

#[derive(Debug, Serialize)]
struct DocumentContext {
    file_id: String,
    text: String,
    analysis: String,
}

impl LegalAgent {
    /// Creates the agent.
    #[must_use]
    pub fn new(context: AgentContext, model: Arc<dyn LanguageModel>) -> Self {
        Self { context, model }
    }

    async fn complete(&self, request: LlmRequest) -> AgentResult<String> {
        let model = &self.model;
        let request = &request;
        let response = self
            .context
            .retry()
            .run("language model", move || model.complete(request))
            .await?;
        Ok(response.text)
    }

    async fn parsed_text(&self, envelope: &Envelope) -> AgentResult<String> {
        if let Some(key) = envelope.payload_str("text_key") {
            return self
                .context
                .documents()
                .get_text(&BlobKey::new(key))
                .await
                .ok_or_else(|| AgentError::not_found(format!("parsed text at '{key}'")));
        }
        envelope
            .payload_str("text")
            .map(str::to_owned)
            .ok_or_else(|| AgentError::not_found("parsed text reference"))
    }

    async fn analyse(&self, envelope: &Envelope) -> AgentResult<()> {
        let file_id = FileId::new(envelope.payload_str("file_id").unwrap_or(UNKNOWN_FILE));
        let text = self.parsed_text(envelope).await?;
        let limits = *self.context.limits();
        let snippet = truncate_chars(&text, limits.snippet_length);
        let prompt = self
            .context
            .prompts()
            .render("legal_review", context! { snippet })?;
        let request = LlmRequest::new(prompt, limits.analysis_max_tokens)
            .with_metadata("file_id", file_id.as_str())
            .with_metadata("correlation_id", envelope.correlation_id().as_str());

        let analysis = match self.complete(request).await {
            Ok(analysis) => analysis,
            Err(AgentError::UpstreamUnavailable { reason, .. }) => {
                let payload = payload_of(json!({
                    "file_id": file_id.as_str(),
                    "text_key": envelope.payload_str("text_key"),
                    "reason": reason,
                }));
                self.context
                    .emit(AgentKind::Legal, envelope, topics::ANALYSIS_FAILED, payload)
                    .await?;
                return Ok(());
            }
            Err(other) => return Err(other),
        };

        let scope = TextScope::Analysis {
            session_id: envelope.session_id().cloned(),
            file_id: file_id.clone(),
        };
        let stored = self
            .context
            .store_or_inline(&scope, &analysis, limits.reply_fallback_limit)
            .await;
        if let (Some(session_id), Some(key)) = (envelope.session_id(), stored.key.as_ref()) {
            if let Err(err) = self
                .context
                .documents()
                .link_artifact(session_id, &file_id, DocumentArtifact::Analysis, key)
                .await
            {
                tracing::warn!(file_id = %file_id, error = %err, "failed to link analysis pointer");
            }
        }

        let mut payload = payload_of(json!({ "file_id": file_id.as_str() }));
        stored.write_into(&mut payload, "analysis_key", "text");
        self.context
            .emit(
                AgentKind::Legal,
                envelope,
                topics::ANALYSIS_COMPLETED,
                payload,
            )
            .await?;
        Ok(())
    }

    async fn document_contexts(&self, envelope: &Envelope) -> Vec<DocumentContext> {
        let limits = *self.context.limits();
        let documents = self.context.documents();
        let explicit_text = match envelope.payload_str("text_key") {
            Some(key) => documents.get_text(&BlobKey::new(key)).await,
            None => None,
        };
        let explicit_analysis = match envelope.payload_str("previous_analysis_key") {
            Some(key) => documents.get_text(&BlobKey::new(key)).await,
            None => None,
        };

        let file_ids = match (envelope.payload_str("document_id"), envelope.session_id()) {
            (Some(document_id), _) => vec![FileId::new(document_id)],
            (None, Some(session_id)) => documents.active_documents(session_id).await,
            (None, None) => Vec::new(),
        };

        let mut contexts = Vec::with_capacity(file_ids.len());
        for file_id in file_ids {
            let (text, analysis) = match envelope.session_id() {
                Some(session_id) => (
                    documents
                        .artifact_text(session_id, &file_id, DocumentArtifact::Text)
                        .await,
                    documents
                        .artifact_text(session_id, &file_id, DocumentArtifact::Analysis)
                        .await,
                ),
                None => (None, None),
            };
            contexts.push(DocumentContext {
                file_id: file_id.to_string(),
                text: truncate_chars(
                    &text.or_else(|| explicit_text.clone()).unwrap_or_default(),
                    limits.snippet_length,
                ),
                analysis: analysis
                    .or_else(|| explicit_analysis.clone())
                    .unwrap_or_default(),
            });
        }
        contexts
    }

    async fn followup_failed(
        &self,
        envelope: &Envelope,
        query: &str,
        reason: &str,
    ) -> AgentResult<()> {
        let payload = payload_of(json!({ "query": query, "reason": reason }));
        self.context
            .emit(
                AgentKind::Legal,
                envelope,
                topics::LEGAL_FOLLOWUP_FAILED,
                payload,
            )
            .await?;
        Ok(())
    }

    fn followup_prompt(
        &self,
        query: &str,
        menu: bool,
        documents: &[DocumentContext],
    ) -> AgentResult<Option<String>> {
        let prompts = self.context.prompts();
        if menu {
            if !prompts.is_menu_item(query) {
                return Ok(None);
            }
            let snippet = documents
                .iter()
                .map(|document| document.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            return Ok(Some(prompts.render(query, context! { snippet })?));
        }
        Ok(Some(prompts.render(
            "legal_followup",
            context! { query, documents },
        )?))
    }

    async fn answer_followup(&self, envelope: &Envelope) -> AgentResult<()> {
        let query = envelope
            .payload_str("query")
            .or_else(|| envelope.payload_str("text"))
            .ok_or(ValidationError::MissingField("query"))?;
        let menu = envelope.payload_str("query_type") == Some("menu");
        let documents = self.document_contexts(envelope).await;

        let Some(prompt) = self.followup_prompt(query, menu, &documents)? else {
            tracing::warn!(query, "unknown menu item requested");
            return self
                .followup_failed(envelope, query, &format!("unknown menu item '{query}'"))
                .await;
        };

        let limits = *self.context.limits();
        let request = LlmRequest::new(prompt, limits.followup_max_tokens)
            .with_metadata("correlation_id", envelope.correlation_id().as_str());
        let answer = match self.complete(request).await {
            Ok(answer) => answer,
            Err(AgentError::UpstreamUnavailable { reason, .. }) => {
                return self.followup_failed(envelope, query, &reason).await;
            }
            Err(other) => return Err(other),
        };

        let scope = TextScope::Followup {
            session_id: envelope.session_id().cloned(),
            query: query.to_owned(),
        };
        let stored = self
            .context
            .store_or_inline(&scope, &answer, limits.reply_fallback_limit)
            .await;
        let document_ids: Vec<Value> = documents
            .iter()
            .map(|document| Value::from(document.file_id.as_str()))
            .collect();
        let mut payload = payload_of(json!({
            "query": query,
            "document_ids": document_ids,
        }));
        stored.write_into(&mut payload, "answer_key", "answer");
        self.context
            .emit(
                AgentKind::Legal,
                envelope,
                topics::LEGAL_FOLLOWUP_COMPLETED,
                payload,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Agent for LegalAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Legal
    }

    async fn handle(&self, event: &str, envelope: &Envelope) -> AgentResult<()> {
        match event {
            topics::DOCS_PARSED => self.analyse(envelope).await,
            topics::LEGAL_FOLLOWUP_REQUESTED => self.answer_followup(envelope).await,
            other => Err(AgentError::UnknownEvent(other.to_owned())),
        }
    }
}
