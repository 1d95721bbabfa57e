//! Ingress from live connections and the upload API.

use mockable::Clock;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::bus::services::EnvelopePublisher;
use crate::delivery::{
    domain::{HistoryEntry, InboundMessage, UploadNotice},
    error::GatewayError,
    ports::ChatHistoryRepository,
};
use crate::envelope::{Envelope, SessionId, UserId, topics};

/// `source` of envelopes created from chat messages.
pub const GATEWAY_SOURCE: &str = "gateway";
/// `source` of envelopes announcing uploads.
pub const UPLOAD_SOURCE: &str = "upload-api";

/// Turns client input into bus events, minting the correlation id.
pub struct ChatGateway<C: Clock + Send + Sync> {
    publisher: EnvelopePublisher,
    history: Arc<dyn ChatHistoryRepository>,
    clock: Arc<C>,
}

impl<C: Clock + Send + Sync> ChatGateway<C> {
    /// Creates a gateway.
    #[must_use]
    pub fn new(
        publisher: EnvelopePublisher,
        history: Arc<dyn ChatHistoryRepository>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            publisher,
            history,
            clock,
        }
    }

    /// Accepts a frame `{message: {text, documents?, session_id?}}` from
    /// `user_id`, records it and publishes `user.message`.
    ///
    /// Returns the published envelope.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the frame is malformed or publishing
    /// fails. History failures are logged only.
    pub async fn handle_inbound(
        &self,
        user_id: &UserId,
        frame: &Value,
    ) -> Result<Envelope, GatewayError> {
        let message = InboundMessage::from_frame(frame)?;
        let mut payload = json!({ "text": message.text });
        if !message.documents.is_empty()
            && let Some(map) = payload.as_object_mut()
        {
            map.insert("documents".to_owned(), json!(message.documents));
        }

        let envelope = Envelope::builder(GATEWAY_SOURCE, topics::USER_MESSAGE)
            .user_id(Some(user_id.clone()))
            .session_id(message.session_id.clone())
            .build(payload)?;

        let entry = HistoryEntry::inbound(
            user_id.clone(),
            envelope.correlation_id().clone(),
            message.text.as_str(),
            frame.get("message").cloned().unwrap_or(Value::Null),
            self.clock.as_ref(),
        );
        if let Err(err) = self.history.append(&entry).await {
            tracing::warn!(user_id = %user_id, error = %err, "failed to record inbound history");
        }

        self.publisher.publish(topics::USER_MESSAGE, &envelope).await?;
        tracing::info!(
            user_id = %user_id,
            correlation_id = %envelope.correlation_id(),
            "accepted user message"
        );
        Ok(envelope)
    }

    /// Publishes `docs.uploaded` for a stored object.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingUploadField`] for a blank bucket or
    /// object id, or [`GatewayError::Publish`] when publishing fails.
    pub async fn notify_upload(
        &self,
        user_id: Option<UserId>,
        session_id: Option<SessionId>,
        notice: &UploadNotice,
    ) -> Result<Envelope, GatewayError> {
        if notice.bucket.trim().is_empty() {
            return Err(GatewayError::MissingUploadField("bucket"));
        }
        if notice.object_id.trim().is_empty() {
            return Err(GatewayError::MissingUploadField("object_id"));
        }
        let file_id = notice.file_id.as_deref().unwrap_or(&notice.object_id);
        let envelope = Envelope::builder(UPLOAD_SOURCE, topics::DOCS_UPLOADED)
            .user_id(user_id)
            .session_id(session_id)
            .build(json!({
                "bucket": notice.bucket,
                "object_id": notice.object_id,
                "file_id": file_id,
            }))?;
        self.publisher.publish(topics::DOCS_UPLOADED, &envelope).await?;
        tracing::info!(
            file_id,
            correlation_id = %envelope.correlation_id(),
            "announced upload"
        );
        Ok(envelope)
    }
}

impl<C: Clock + Send + Sync> std::fmt::Debug for ChatGateway<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatGateway").finish_non_exhaustive()
    }
}
