//! In-memory chat history.

use async_trait::async_trait;
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};

use crate::delivery::{
    domain::HistoryEntry,
    error::{HistoryError, HistoryResult},
    ports::ChatHistoryRepository,
};
use crate::envelope::UserId;

/// Thread-safe in-memory chat history.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChatHistory {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryChatHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`HistoryError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_reachable(&self) -> HistoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HistoryError::Unavailable("in-memory history offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatHistoryRepository for InMemoryChatHistory {
    async fn append(&self, entry: &HistoryEntry) -> HistoryResult<()> {
        self.ensure_reachable()?;
        self.entries
            .write()
            .map_err(|err| HistoryError::Unavailable(err.to_string()))?
            .push(entry.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &UserId) -> HistoryResult<Vec<HistoryEntry>> {
        self.ensure_reachable()?;
        let mut entries: Vec<HistoryEntry> = self
            .entries
            .read()
            .map_err(|err| HistoryError::Unavailable(err.to_string()))?
            .iter()
            .filter(|entry| entry.user_id() == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(HistoryEntry::created_at);
        Ok(entries)
    }
}
