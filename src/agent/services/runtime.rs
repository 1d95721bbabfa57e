//! Record handler shared by every agent.

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::{
    domain::{AgentKind, RecordLifecycle, RecordStage},
    error::{AgentError, AgentResult},
};
use crate::bus::ports::{HandlerError, RecordHandler};
use crate::envelope::{Envelope, topics::LEGACY_MESSAGE, unwrap_or_adapt};

/// One processing agent.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns which agent this is.
    fn kind(&self) -> AgentKind;

    /// Handles one envelope whose event is `event`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the record cannot be handled.
    /// [`AgentError::Publish`] causes redelivery; everything else drops the
    /// record.
    async fn handle(&self, event: &str, envelope: &Envelope) -> AgentResult<()>;
}

/// Adapts raw records, drives the record lifecycle and applies the error
/// propagation policy around an [`Agent`].
pub struct AgentRuntime<A> {
    agent: A,
}

impl<A: Agent> AgentRuntime<A> {
    /// Wraps an agent.
    pub const fn new(agent: A) -> Self {
        Self { agent }
    }

    /// Returns the wrapped agent.
    pub const fn agent(&self) -> &A {
        &self.agent
    }

    /// Processes one decoded record.
    ///
    /// Returns the final lifecycle stage, or the publish failure that must
    /// leave the record uncommitted.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] only when a downstream publish failed.
    pub async fn process(&self, topic: &str, payload: Value) -> Result<RecordStage, HandlerError> {
        let kind = self.agent.kind();
        let mut lifecycle = RecordLifecycle::new();

        let (envelope, correlation_id) = match unwrap_or_adapt(payload) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(agent = %kind, topic, error = %err, "dropping invalid record");
                advance(&mut lifecycle, RecordStage::Failed);
                return Ok(lifecycle.stage());
            }
        };
        advance(&mut lifecycle, RecordStage::Validated);

        // Legacy records carry no event of their own; their topic names it.
        let event = if envelope.event() == LEGACY_MESSAGE {
            topic
        } else {
            envelope.event()
        };
        if !kind.handles(event) {
            tracing::warn!(
                agent = %kind,
                topic,
                event,
                correlation_id = %correlation_id,
                "dropping record with unknown event"
            );
            advance(&mut lifecycle, RecordStage::Failed);
            return Ok(lifecycle.stage());
        }

        advance(&mut lifecycle, RecordStage::Processing);
        tracing::debug!(
            agent = %kind,
            event,
            correlation_id = %correlation_id,
            "processing record"
        );

        match self.agent.handle(event, &envelope).await {
            Ok(()) => {
                advance(&mut lifecycle, RecordStage::Succeeded);
                tracing::debug!(
                    agent = %kind,
                    event,
                    correlation_id = %correlation_id,
                    "record handled"
                );
                Ok(lifecycle.stage())
            }
            Err(AgentError::Publish(err)) => {
                advance(&mut lifecycle, RecordStage::Failed);
                tracing::error!(
                    agent = %kind,
                    event,
                    correlation_id = %correlation_id,
                    error = %err,
                    "downstream publish failed; record will be redelivered"
                );
                Err(HandlerError::new(err.to_string()))
            }
            Err(err) => {
                advance(&mut lifecycle, RecordStage::Failed);
                log_dropped(kind, event, correlation_id.as_str(), &err);
                Ok(lifecycle.stage())
            }
        }
    }
}

fn advance(lifecycle: &mut RecordLifecycle, next: RecordStage) {
    if let Err(err) = lifecycle.advance(next) {
        tracing::error!(error = %err, "invalid record lifecycle transition");
    }
}

fn log_dropped(kind: AgentKind, event: &str, correlation_id: &str, err: &AgentError) {
    match err {
        AgentError::NotFound(_) | AgentError::Validation(_) | AgentError::UnknownEvent(_) => {
            tracing::warn!(agent = %kind, event, correlation_id, error = %err, "skipping record");
        }
        _ => {
            tracing::error!(agent = %kind, event, correlation_id, error = %err, "record failed");
        }
    }
}

#[async_trait]
impl<A: Agent> RecordHandler for AgentRuntime<A> {
    async fn handle(
        &self,
        topic: &str,
        payload: Value,
        _key: Option<&str>,
    ) -> Result<(), HandlerError> {
        self.process(topic, payload).await.map(|_| ())
    }
}
