//! `PostgreSQL` adapter for chat history.

mod models;
mod repository;
mod schema;

pub use repository::{HistoryPgPool, PostgresChatHistory};

#[cfg(test)]
pub(crate) use models::{ChatMessageRow, NewChatMessageRow};
#[cfg(test)]
pub(crate) use repository::{list_query, row_to_entry, to_new_row};
