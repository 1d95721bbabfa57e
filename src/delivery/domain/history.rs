//! Persisted chat history entries.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::OutboundMessage;
use crate::envelope::{CorrelationId, UserId};

/// Identifier of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntryId(Uuid);

impl HistoryEntryId {
    /// Creates a new random entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entry identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for HistoryEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the user.
    User,
    /// Sent to the user.
    Bot,
}

impl Direction {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    /// Parses the persisted representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "bot" => Some(Self::Bot),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message exchanged with a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    id: HistoryEntryId,
    user_id: UserId,
    correlation_id: Option<CorrelationId>,
    direction: Direction,
    text: Option<String>,
    payload: Value,
    created_at: DateTime<Utc>,
}

/// Stored fields of a history entry, used by repositories to rebuild it.
#[derive(Debug, Clone)]
pub struct PersistedHistoryEntry {
    /// Entry identifier.
    pub id: HistoryEntryId,
    /// Owning user.
    pub user_id: UserId,
    /// Correlation id of the request the message belongs to.
    pub correlation_id: Option<CorrelationId>,
    /// Author of the message.
    pub direction: Direction,
    /// Display text.
    pub text: Option<String>,
    /// Raw payload.
    pub payload: Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Records a message sent by the user.
    #[must_use]
    pub fn inbound(
        user_id: UserId,
        correlation_id: CorrelationId,
        text: impl Into<String>,
        payload: Value,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: HistoryEntryId::new(),
            user_id,
            correlation_id: Some(correlation_id),
            direction: Direction::User,
            text: Some(text.into()),
            payload,
            created_at: clock.utc(),
        }
    }

    /// Records a message delivered to the user.
    #[must_use]
    pub fn outbound(user_id: UserId, message: &OutboundMessage, clock: &impl Clock) -> Self {
        Self {
            id: HistoryEntryId::new(),
            user_id,
            correlation_id: Some(message.envelope().correlation_id().clone()),
            direction: Direction::Bot,
            text: message.reply().map(str::to_owned),
            payload: message.to_value(),
            created_at: clock.utc(),
        }
    }

    /// Rebuilds an entry from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedHistoryEntry) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            correlation_id: data.correlation_id,
            direction: data.direction,
            text: data.text,
            payload: data.payload,
            created_at: data.created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> HistoryEntryId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the correlation id, if known.
    #[must_use]
    pub const fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    /// Returns who authored the message.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the display text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the raw payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
