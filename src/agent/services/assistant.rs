//! Assistant agent: chat replies and analysis formatting.

use async_trait::async_trait;
use minijinja::context;
use serde_json::json;
use std::sync::Arc;

use crate::agent::{
    domain::{AgentKind, truncate_chars},
    error::{AgentError, AgentResult},
    ports::{LanguageModel, LlmRequest},
    services::{Agent, AgentContext, context::payload_of},
};
use crate::envelope::{Envelope, SessionId, ValidationError, topics};
use crate::session::domain::{BlobKey, TextScope};

/// Answers user messages and turns analyses into replies.
///
/// Messages in sessions with active documents are delegated to the legal
/// agent instead of being answered here.
pub struct AssistantAgent {
    context: AgentContext,
    model: Arc<dyn LanguageModel>,
    review_drafts: bool,
}

impl AssistantAgent {
    /// Creates the agent publishing replies directly.
    #[must_use]
    pub fn new(context: AgentContext, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            context,
            model,
            review_drafts: false,
        }
    }

    /// Routes replies through the validator as `draft.created` events.
    #[must_use]
    pub const fn with_draft_review(mut self, review_drafts: bool) -> Self {
        self.review_drafts = review_drafts;
        self
    }

    async fn reply_to_analysis(&self, envelope: &Envelope) -> AgentResult<()> {
        let analysis_key = envelope.payload_str("analysis_key");
        let analysis = match analysis_key {
            Some(key) => self.context.documents().get_text(&BlobKey::new(key)).await,
            None => envelope.payload_str("text").map(str::to_owned),
        }
        .ok_or_else(|| {
            AgentError::not_found(format!(
                "analysis at '{}'",
                analysis_key.unwrap_or("<inline>")
            ))
        })?;

        let reply = self
            .context
            .prompts()
            .render("analysis_reply", context! { analysis })?;
        let payload = payload_of(json!({
            "text": reply,
            "analysis_key": analysis_key,
            "file_id": envelope.payload_str("file_id"),
        }));
        self.context
            .emit_event(
                AgentKind::Assistant,
                envelope,
                topics::ASSISTANT_RESPONSE,
                topics::ASSISTANT_REPLY_COMPLETED,
                payload,
            )
            .await?;
        Ok(())
    }

    fn session_of(envelope: &Envelope) -> Option<SessionId> {
        envelope
            .session_id()
            .cloned()
            .or_else(|| envelope.payload_str("session_id").map(SessionId::new))
    }

    async fn answer_message(&self, envelope: &Envelope) -> AgentResult<()> {
        let text = envelope
            .payload_str("text")
            .ok_or(ValidationError::EmptyField("text"))?;
        let session_id = Self::session_of(envelope);

        if let Some(session) = session_id.as_ref()
            && self.context.documents().has_active_documents(session).await
        {
            tracing::info!(
                session_id = %session,
                correlation_id = %envelope.correlation_id(),
                "session has active documents; delegating to legal"
            );
            let payload = payload_of(json!({
                "query": text,
                "text": text,
                "session_id": session.as_str(),
            }));
            self.context
                .emit(
                    AgentKind::Assistant,
                    envelope,
                    topics::LEGAL_FOLLOWUP_REQUESTED,
                    payload,
                )
                .await?;
            return Ok(());
        }

        let limits = *self.context.limits();
        let snippet = truncate_chars(text, limits.snippet_length);
        let prompt = self
            .context
            .prompts()
            .render("assistant_reply", context! { snippet })?;
        let mut request = LlmRequest::new(prompt, limits.reply_max_tokens)
            .with_metadata("correlation_id", envelope.correlation_id().as_str());
        if let Some(user_id) = envelope.user_id() {
            request = request.with_metadata("user_id", user_id.as_str());
        }

        let model = &self.model;
        let request = &request;
        let reply = match self
            .context
            .retry()
            .run("language model", move || model.complete(request))
            .await
        {
            Ok(response) => response.text,
            Err(AgentError::UpstreamUnavailable { reason, .. }) => {
                let payload = payload_of(json!({ "reason": reason }));
                self.context
                    .emit(AgentKind::Assistant, envelope, topics::CHAT_ERROR, payload)
                    .await?;
                return Ok(());
            }
            Err(other) => return Err(other),
        };

        let scope = TextScope::AssistantReply {
            session_id,
            correlation_id: envelope.correlation_id().clone(),
        };
        let stored = self
            .context
            .store_or_inline(&scope, &reply, limits.reply_fallback_limit)
            .await;

        let mut payload = payload_of(json!({}));
        if self.review_drafts {
            stored.write_into(&mut payload, "reply_key", "draft");
            self.context
                .emit(
                    AgentKind::Assistant,
                    envelope,
                    topics::DRAFT_CREATED,
                    payload,
                )
                .await?;
        } else {
            stored.write_into(&mut payload, "reply_key", "text");
            self.context
                .emit_event(
                    AgentKind::Assistant,
                    envelope,
                    topics::ASSISTANT_RESPONSE,
                    topics::ASSISTANT_REPLY_COMPLETED,
                    payload,
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Agent for AssistantAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Assistant
    }

    async fn handle(&self, event: &str, envelope: &Envelope) -> AgentResult<()> {
        match event {
            topics::ANALYSIS_COMPLETED => self.reply_to_analysis(envelope).await,
            topics::USER_MESSAGE => self.answer_message(envelope).await,
            other => Err(AgentError::UnknownEvent(other.to_owned())),
        }
    }
}
