//! Frames received from live connections and upload notices.

use serde::Deserialize;
use serde_json::Value;

use crate::delivery::error::GatewayError;
use crate::envelope::SessionId;

/// A chat message sent by the user over a live connection.
///
/// Arrives as `{message: {text, documents?, session_id?}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    /// The user's text.
    #[serde(default)]
    pub text: String,
    /// Document identifiers the message refers to.
    #[serde(default)]
    pub documents: Vec<String>,
    /// Chat session the message belongs to.
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

impl InboundMessage {
    /// Parses an inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingMessage`] when the frame has no
    /// `message`, [`GatewayError::Malformed`] when `message` is not shaped as
    /// expected and [`GatewayError::MissingText`] when the text is blank.
    pub fn from_frame(frame: &Value) -> Result<Self, GatewayError> {
        let message = frame
            .get("message")
            .filter(|value| !value.is_null())
            .ok_or(GatewayError::MissingMessage)?;
        let parsed: Self = serde_json::from_value(message.clone())
            .map_err(|err| GatewayError::Malformed(err.to_string()))?;
        if parsed.text.trim().is_empty() {
            return Err(GatewayError::MissingText);
        }
        Ok(parsed)
    }
}

/// Announcement that an uploaded object is ready for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadNotice {
    /// Bucket holding the object.
    pub bucket: String,
    /// Object identifier within the bucket.
    pub object_id: String,
    /// Document identifier; defaults to the object identifier downstream.
    pub file_id: Option<String>,
}

impl UploadNotice {
    /// Creates a notice for an object.
    #[must_use]
    pub fn new(bucket: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object_id: object_id.into(),
            file_id: None,
        }
    }

    /// Sets an explicit document identifier.
    #[must_use]
    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }
}
