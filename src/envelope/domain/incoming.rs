//! Boundary adapter resolving raw bus values into envelopes.

use serde_json::{Map, Value};

use super::envelope::{Envelope, EnvelopeParts, Payload, validate_value};
use super::ids::{CorrelationId, SessionId, UserId};
use crate::envelope::error::ValidationError;
use crate::envelope::topics::{LEGACY_MESSAGE, LEGACY_SOURCE};

/// Keys copied from a legacy message into the adapted payload.
const LEGACY_PAYLOAD_KEYS: [&str; 2] = ["text", "session_id"];

/// A raw record as seen at the consumer boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// The record already carries `event`, `correlation_id` and `payload`.
    WellFormed(Envelope),
    /// The record predates the envelope contract.
    Legacy(LegacyMessage),
}

impl IncomingMessage {
    /// Classifies a raw JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAMapping`] for non-object input and the
    /// validation failures of [`validate_value`] for an envelope-shaped
    /// record whose fields are unusable.
    pub fn classify(raw: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut fields) = raw else {
            return Err(ValidationError::NotAMapping);
        };

        let envelope_shaped = ["event", "correlation_id", "payload"]
            .iter()
            .all(|key| fields.contains_key(*key));
        if !envelope_shaped {
            return Ok(Self::Legacy(LegacyMessage { fields }));
        }

        let has_source = fields
            .get("source")
            .and_then(Value::as_str)
            .is_some_and(|source| !source.trim().is_empty());
        if !has_source {
            fields.insert("source".to_owned(), Value::from(LEGACY_SOURCE));
        }
        let shaped = Value::Object(fields);
        validate_value(&shaped)?;
        let envelope: Envelope = serde_json::from_value(shaped)
            .map_err(|err| ValidationError::malformed("envelope", err.to_string()))?;
        envelope.validate()?;
        Ok(Self::WellFormed(envelope))
    }

    /// Resolves the message into a well-formed envelope.
    #[must_use]
    pub fn into_envelope(self) -> Envelope {
        match self {
            Self::WellFormed(envelope) => envelope,
            Self::Legacy(legacy) => legacy.adapt(),
        }
    }
}

/// A flat message lacking the envelope shape.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMessage {
    fields: Map<String, Value>,
}

impl LegacyMessage {
    /// Returns the raw fields of the legacy message.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Adapts the message into a well-formed envelope.
    ///
    /// Reuses the message's own `correlation_id`, `source` and `event` strings
    /// when present; otherwise mints a correlation id and falls back to the
    /// legacy source and event names. The payload keeps the recognised keys
    /// only.
    #[must_use]
    pub fn adapt(self) -> Envelope {
        let payload: Payload = LEGACY_PAYLOAD_KEYS
            .iter()
            .filter_map(|key| {
                self.fields
                    .get(*key)
                    .map(|value| ((*key).to_owned(), value.clone()))
            })
            .collect();

        let correlation_id = self
            .string_field("correlation_id")
            .and_then(|raw| CorrelationId::parse(raw).ok())
            .unwrap_or_default();
        let source = self.string_field("source").unwrap_or(LEGACY_SOURCE);
        let event = self.string_field("event").unwrap_or(LEGACY_MESSAGE);

        Envelope::from_parts(EnvelopeParts {
            user_id: self.string_field("user_id").map(UserId::new),
            session_id: self.string_field("session_id").map(SessionId::new),
            correlation_id,
            source: source.to_owned(),
            event: event.to_owned(),
            payload,
        })
    }
}

/// Resolves a raw record into an envelope and its correlation identifier.
///
/// Well-formed envelopes are returned unchanged, except that a missing or
/// blank `source` becomes the legacy source; legacy messages are adapted.
/// Adaptation is idempotent: adapting the wire form of an adapted envelope
/// yields the same envelope.
///
/// # Errors
///
/// Returns [`ValidationError::NotAMapping`] when the record is not a mapping
/// and [`ValidationError::PayloadNotMapping`] when an envelope-shaped record
/// carries a non-mapping payload.
pub fn unwrap_or_adapt(raw: Value) -> Result<(Envelope, CorrelationId), ValidationError> {
    let envelope = IncomingMessage::classify(raw)?.into_envelope();
    let correlation_id = envelope.correlation_id().clone();
    Ok((envelope, correlation_id))
}
