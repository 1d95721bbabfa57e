//! Chat history repository port.

use async_trait::async_trait;

use crate::delivery::{domain::HistoryEntry, error::HistoryResult};
use crate::envelope::UserId;

/// Persistence contract for exchanged chat messages.
#[async_trait]
pub trait ChatHistoryRepository: Send + Sync {
    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::delivery::error::HistoryError`] when the entry cannot
    /// be stored.
    async fn append(&self, entry: &HistoryEntry) -> HistoryResult<()>;

    /// Lists every entry of a user ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::delivery::error::HistoryError`] when the repository
    /// cannot be read.
    async fn list_for_user(&self, user_id: &UserId) -> HistoryResult<Vec<HistoryEntry>>;
}
