//! `PostgreSQL` repository implementation for chat history.

use super::{
    models::{ChatMessageRow, NewChatMessageRow},
    schema::chat_messages,
};
use crate::delivery::{
    domain::{Direction, HistoryEntry, HistoryEntryId, PersistedHistoryEntry},
    error::{HistoryError, HistoryResult},
    ports::ChatHistoryRepository,
};
use crate::envelope::{CorrelationId, UserId};
use async_trait::async_trait;
use diesel::dsl;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by the chat history adapter.
pub type HistoryPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed chat history.
#[derive(Debug, Clone)]
pub struct PostgresChatHistory {
    pool: HistoryPgPool,
}

impl PostgresChatHistory {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: HistoryPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> HistoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> HistoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(HistoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(HistoryError::persistence)?
    }
}

#[async_trait]
impl ChatHistoryRepository for PostgresChatHistory {
    async fn append(&self, entry: &HistoryEntry) -> HistoryResult<()> {
        let new_row = to_new_row(entry);
        self.run_blocking(move |connection| {
            diesel::insert_into(chat_messages::table)
                .values(&new_row)
                .execute(connection)
                .map_err(HistoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn list_for_user(&self, user_id: &UserId) -> HistoryResult<Vec<HistoryEntry>> {
        let owner = user_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = list_query(owner)
                .select(ChatMessageRow::as_select())
                .load::<ChatMessageRow>(connection)
                .map_err(HistoryError::persistence)?;
            rows.into_iter().map(row_to_entry).collect()
        })
        .await
    }
}

/// Rows of one user, oldest first; ties are broken by id.
pub(crate) type ListQuery = dsl::Order<
    dsl::Filter<chat_messages::table, dsl::Eq<chat_messages::user_id, String>>,
    (dsl::Asc<chat_messages::created_at>, dsl::Asc<chat_messages::id>),
>;

pub(crate) fn list_query(owner: String) -> ListQuery {
    chat_messages::table
        .filter(chat_messages::user_id.eq(owner))
        .order((chat_messages::created_at.asc(), chat_messages::id.asc()))
}

pub(crate) fn to_new_row(entry: &HistoryEntry) -> NewChatMessageRow {
    NewChatMessageRow {
        id: entry.id().into_inner(),
        user_id: entry.user_id().as_str().to_owned(),
        correlation_id: entry.correlation_id().map(|id| id.as_str().to_owned()),
        direction: entry.direction().as_str().to_owned(),
        text: entry.text().map(str::to_owned),
        payload: entry.payload().clone(),
        created_at: entry.created_at(),
    }
}

pub(crate) fn row_to_entry(row: ChatMessageRow) -> HistoryResult<HistoryEntry> {
    let ChatMessageRow {
        id,
        user_id,
        correlation_id,
        direction: persisted_direction,
        text,
        payload,
        created_at,
    } = row;

    let direction = Direction::parse(&persisted_direction).ok_or_else(|| {
        HistoryError::Corrupt(format!("unknown direction '{persisted_direction}' for {id}"))
    })?;
    let correlation = correlation_id
        .map(CorrelationId::parse)
        .transpose()
        .map_err(|err| HistoryError::Corrupt(err.to_string()))?;

    Ok(HistoryEntry::from_persisted(PersistedHistoryEntry {
        id: HistoryEntryId::from_uuid(id),
        user_id: UserId::new(user_id),
        correlation_id: correlation,
        direction,
        text,
        payload,
        created_at,
    }))
}
