//! Diesel row models for chat history.

use super::schema::chat_messages;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for chat messages.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chat_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChatMessageRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub user_id: String,
    /// Correlation id.
    pub correlation_id: Option<String>,
    /// Direction label.
    pub direction: String,
    /// Display text.
    pub text: Option<String>,
    /// Raw payload.
    pub payload: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for chat messages.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chat_messages)]
pub struct NewChatMessageRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub user_id: String,
    /// Correlation id.
    pub correlation_id: Option<String>,
    /// Direction label.
    pub direction: String,
    /// Display text.
    pub text: Option<String>,
    /// Raw payload.
    pub payload: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
