//! The envelope aggregate and its builder.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{CorrelationId, SessionId, UserId};
use crate::envelope::error::ValidationError;

/// Payload carried by an envelope: string keys, arbitrary nested values.
pub type Payload = Map<String, Value>;

/// Fields that must be present (and non-null) on the wire.
const REQUIRED_FIELDS: [&str; 4] = ["correlation_id", "source", "event", "payload"];

/// Canonical unit of communication on the bus.
///
/// Serialises to the wire shape
/// `{user_id, session_id, correlation_id, source, event, payload}` with
/// absent identities rendered as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    session_id: Option<SessionId>,
    correlation_id: CorrelationId,
    source: String,
    event: String,
    payload: Payload,
}

/// Raw parts used by in-crate adapters that guarantee the invariants.
pub(super) struct EnvelopeParts {
    pub(super) user_id: Option<UserId>,
    pub(super) session_id: Option<SessionId>,
    pub(super) correlation_id: CorrelationId,
    pub(super) source: String,
    pub(super) event: String,
    pub(super) payload: Payload,
}

impl Envelope {
    /// Assembles an envelope from parts whose invariants the caller upholds.
    pub(super) fn from_parts(parts: EnvelopeParts) -> Self {
        Self {
            user_id: parts.user_id,
            session_id: parts.session_id,
            correlation_id: parts.correlation_id,
            source: parts.source,
            event: parts.event,
            payload: parts.payload,
        }
    }

    /// Starts building an envelope for the given producer and event.
    #[must_use]
    pub fn builder(source: impl Into<String>, event: impl Into<String>) -> EnvelopeBuilder {
        EnvelopeBuilder {
            user_id: None,
            session_id: None,
            correlation_id: None,
            source: source.into(),
            event: event.into(),
        }
    }

    /// Returns the user identity, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Returns the session identity, if any.
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Returns the correlation identifier.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Returns the producing agent tag.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the dotted event name.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Returns the payload mapping.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns a payload entry when it is a string with non-whitespace
    /// content.
    #[must_use]
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Checks the typed invariants: identifiers and names are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.correlation_id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyField("correlation_id"));
        }
        if self.source.trim().is_empty() {
            return Err(ValidationError::EmptyField("source"));
        }
        if self.event.trim().is_empty() {
            return Err(ValidationError::EmptyField("event"));
        }
        Ok(())
    }

    /// Serialises the envelope to its JSON wire shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "user_id".to_owned(),
            self.user_id
                .as_ref()
                .map_or(Value::Null, |id| Value::String(id.as_str().to_owned())),
        );
        map.insert(
            "session_id".to_owned(),
            self.session_id
                .as_ref()
                .map_or(Value::Null, |id| Value::String(id.as_str().to_owned())),
        );
        map.insert(
            "correlation_id".to_owned(),
            Value::String(self.correlation_id.as_str().to_owned()),
        );
        map.insert("source".to_owned(), Value::String(self.source.clone()));
        map.insert("event".to_owned(), Value::String(self.event.clone()));
        map.insert("payload".to_owned(), Value::Object(self.payload.clone()));
        Value::Object(map)
    }
}

/// Checks the raw wire shape of an envelope.
///
/// Verifies that `correlation_id`, `source`, `event` and `payload` are present
/// and non-null, and that `payload` is a mapping.
///
/// # Errors
///
/// Returns [`ValidationError::NotAMapping`] for non-object input,
/// [`ValidationError::MissingField`] for an absent field and
/// [`ValidationError::PayloadNotMapping`] for a scalar or list payload.
pub fn validate_value(raw: &Value) -> Result<(), ValidationError> {
    let map = raw.as_object().ok_or(ValidationError::NotAMapping)?;
    for field in REQUIRED_FIELDS {
        match map.get(field) {
            None | Some(Value::Null) => return Err(ValidationError::MissingField(field)),
            Some(_) => {}
        }
    }
    if !map.get("payload").is_some_and(Value::is_object) {
        return Err(ValidationError::PayloadNotMapping);
    }
    Ok(())
}

/// Builder for [`Envelope`].
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    user_id: Option<UserId>,
    session_id: Option<SessionId>,
    correlation_id: Option<CorrelationId>,
    source: String,
    event: String,
}

impl EnvelopeBuilder {
    /// Sets the user identity.
    #[must_use]
    pub fn user_id(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sets the session identity.
    #[must_use]
    pub fn session_id(mut self, session_id: Option<SessionId>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Reuses an existing correlation identifier instead of minting one.
    #[must_use]
    pub fn correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Inherits user, session and correlation identity from a causing event.
    #[must_use]
    pub fn caused_by(self, cause: &Envelope) -> Self {
        self.user_id(cause.user_id.clone())
            .session_id(cause.session_id.clone())
            .correlation_id(cause.correlation_id.clone())
    }

    /// Builds the envelope, generating a correlation identifier when none
    /// was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::PayloadNotMapping`] when `payload` is not a
    /// JSON object, or [`ValidationError::EmptyField`] when `source` or `event`
    /// is blank.
    pub fn build(self, payload: Value) -> Result<Envelope, ValidationError> {
        match payload {
            Value::Object(map) => self.build_with(map),
            _ => Err(ValidationError::PayloadNotMapping),
        }
    }

    /// Builds the envelope from an already-typed payload mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] when `source` or `event` is
    /// blank.
    pub fn build_with(self, payload: Payload) -> Result<Envelope, ValidationError> {
        let envelope = Envelope {
            user_id: self.user_id,
            session_id: self.session_id,
            correlation_id: self.correlation_id.unwrap_or_default(),
            source: self.source,
            event: self.event,
            payload,
        };
        envelope.validate()?;
        Ok(envelope)
    }
}
