//! Validator agent: approves or rejects drafted replies.

use async_trait::async_trait;
use serde_json::json;

use crate::agent::{
    domain::{AgentKind, DraftRules, DraftVerdict},
    error::{AgentError, AgentResult},
    services::{Agent, AgentContext, context::payload_of},
};
use crate::envelope::{Envelope, topics};

/// Checks drafts against [`DraftRules`].
pub struct ValidatorAgent {
    context: AgentContext,
    rules: DraftRules,
}

impl ValidatorAgent {
    /// Creates the agent.
    #[must_use]
    pub const fn new(context: AgentContext, rules: DraftRules) -> Self {
        Self { context, rules }
    }

    async fn review(&self, envelope: &Envelope) -> AgentResult<()> {
        let draft = envelope
            .payload()
            .get("draft")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        let reply_key = envelope.payload_str("reply_key");

        match self.rules.check(draft) {
            DraftVerdict::Approved => {
                tracing::info!(
                    correlation_id = %envelope.correlation_id(),
                    "draft approved"
                );
                let payload = payload_of(json!({
                    "draft": draft,
                    "reply_key": reply_key,
                    "status": "approved",
                }));
                self.context
                    .emit(
                        AgentKind::Validator,
                        envelope,
                        topics::DRAFT_APPROVED,
                        payload,
                    )
                    .await?;
            }
            DraftVerdict::Rejected { reason } => {
                tracing::info!(
                    correlation_id = %envelope.correlation_id(),
                    %reason,
                    "draft rejected"
                );
                // Chat clients render `reply` for a rejection.
                let payload = payload_of(json!({
                    "draft": draft,
                    "reply_key": reply_key,
                    "status": "rejected",
                    "reason": reason,
                    "reply": format!("The drafted reply was withheld: {reason}"),
                }));
                self.context
                    .emit(
                        AgentKind::Validator,
                        envelope,
                        topics::DRAFT_REJECTED,
                        payload,
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Agent for ValidatorAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Validator
    }

    async fn handle(&self, event: &str, envelope: &Envelope) -> AgentResult<()> {
        match event {
            topics::DRAFT_CREATED => self.review(envelope).await,
            other => Err(AgentError::UnknownEvent(other.to_owned())),
        }
    }
}
