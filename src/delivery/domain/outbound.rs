//! Message shape sent to live connections.

use serde::Serialize;
use serde_json::Value;

use crate::envelope::{Envelope, UserId};

/// Payload fields consulted, in order, for the display text.
const TEXT_FIELDS: [&str; 4] = ["text", "answer", "draft", "reason"];

/// An envelope normalised for a live connection.
///
/// Serialises to `{envelope, text?, reply?}`. `text` is the payload's
/// primary text and `reply` the string a chat client should render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    envelope: Envelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<String>,
}

impl OutboundMessage {
    /// Normalises an envelope received from the bus.
    #[must_use]
    pub fn from_envelope(envelope: Envelope) -> Self {
        let text = TEXT_FIELDS
            .iter()
            .find_map(|field| envelope.payload_str(field))
            .map(str::to_owned);
        let reply = envelope
            .payload_str("reply")
            .map(str::to_owned)
            .or_else(|| text.clone());
        Self {
            envelope,
            text,
            reply,
        }
    }

    /// Returns the wrapped envelope.
    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Returns the user the message is addressed to.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.envelope.user_id()
    }

    /// Returns the primary text, if the payload has one.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the string a chat client should render.
    #[must_use]
    pub fn reply(&self) -> Option<&str> {
        self.reply.as_deref()
    }

    /// Serialises the message to its JSON wire shape.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("envelope".to_owned(), self.envelope.to_value());
        if let Some(text) = &self.text {
            map.insert("text".to_owned(), Value::from(text.as_str()));
        }
        if let Some(reply) = &self.reply {
            map.insert("reply".to_owned(), Value::from(reply.as_str()));
        }
        Value::Object(map)
    }
}
