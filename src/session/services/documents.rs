//! Active-document tracking and text blob storage.

use std::sync::Arc;
use std::time::Duration;

use crate::envelope::SessionId;
use crate::session::{
    domain::{BlobKey, DocumentArtifact, FileId, TextScope, active_documents_key, artifact_key},
    error::StoreResult,
    ports::KeyValueStore,
};

/// Default lifetime of every key written by the store (seven days).
pub const DEFAULT_TEXT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Session document state over a [`KeyValueStore`].
///
/// Reads are forgiving: lookups that fail are logged and reported as absent
/// so routing decisions never abort a record. Writes of text results return
/// their errors so callers can degrade to inline payloads.
#[derive(Clone)]
pub struct SessionDocumentStore {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDocumentStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionDocumentStore {
    /// Creates a store writing keys with the default seven-day expiry.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_TEXT_TTL,
        }
    }

    /// Overrides the expiry applied to written keys.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the expiry applied to written keys.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Marks `file_id` active for the session.
    ///
    /// Idempotent. Storage failures are logged and swallowed.
    pub async fn add_active_document(&self, session_id: &SessionId, file_id: &FileId) {
        let key = active_documents_key(session_id);
        match self
            .store
            .set_add(&key, file_id.as_str(), Some(self.ttl))
            .await
        {
            Ok(inserted) => tracing::debug!(
                session_id = %session_id,
                file_id = %file_id,
                inserted,
                "document marked active"
            ),
            Err(err) => tracing::warn!(
                session_id = %session_id,
                file_id = %file_id,
                error = %err,
                "failed to mark document active"
            ),
        }
    }

    /// Returns whether the session has at least one active document.
    ///
    /// A failed lookup counts as no documents.
    pub async fn has_active_documents(&self, session_id: &SessionId) -> bool {
        !self.active_documents(session_id).await.is_empty()
    }

    /// Returns the session's active documents in a stable order.
    ///
    /// A failed lookup yields an empty list.
    pub async fn active_documents(&self, session_id: &SessionId) -> Vec<FileId> {
        match self.store.set_members(&active_documents_key(session_id)).await {
            Ok(members) => members.into_iter().map(FileId::new).collect(),
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %err,
                    "active document lookup failed"
                );
                Vec::new()
            }
        }
    }

    /// Returns whether `file_id` is already active for the session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::session::error::StoreError`] when the store cannot
    /// be read.
    pub async fn is_active(&self, session_id: &SessionId, file_id: &FileId) -> StoreResult<bool> {
        self.store
            .set_contains(&active_documents_key(session_id), file_id.as_str())
            .await
    }

    /// Saves `content` under a fresh key inside `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::session::error::StoreError::Unavailable`] when the
    /// store cannot be reached.
    pub async fn save_text(&self, scope: &TextScope, content: &str) -> StoreResult<BlobKey> {
        let key = scope.generate_key();
        self.store.put(key.as_str(), content, Some(self.ttl)).await?;
        tracing::debug!(key = %key, bytes = content.len(), "saved text blob");
        Ok(key)
    }

    /// Reads the text stored at `key`.
    ///
    /// Returns `None` when the key is missing or the read fails.
    pub async fn get_text(&self, key: &BlobKey) -> Option<String> {
        match self.store.get(key.as_str()).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "text lookup failed");
                None
            }
        }
    }

    /// Points a session document at its latest stored artifact.
    ///
    /// # Errors
    ///
    /// Returns [`crate::session::error::StoreError`] when the pointer cannot
    /// be written.
    pub async fn link_artifact(
        &self,
        session_id: &SessionId,
        file_id: &FileId,
        artifact: DocumentArtifact,
        blob: &BlobKey,
    ) -> StoreResult<()> {
        self.store
            .put(
                &artifact_key(session_id, file_id, artifact),
                blob.as_str(),
                Some(self.ttl),
            )
            .await
    }

    /// Resolves the artifact a session document points at.
    ///
    /// Returns `None` when no pointer exists or the read fails.
    pub async fn artifact(
        &self,
        session_id: &SessionId,
        file_id: &FileId,
        artifact: DocumentArtifact,
    ) -> Option<BlobKey> {
        match self
            .store
            .get(&artifact_key(session_id, file_id, artifact))
            .await
        {
            Ok(pointer) => pointer.map(BlobKey::new),
            Err(err) => {
                tracing::warn!(
                    session_id = %session_id,
                    file_id = %file_id,
                    error = %err,
                    "artifact pointer lookup failed"
                );
                None
            }
        }
    }

    /// Resolves and reads the artifact of a session document.
    pub async fn artifact_text(
        &self,
        session_id: &SessionId,
        file_id: &FileId,
        artifact: DocumentArtifact,
    ) -> Option<String> {
        let key = self.artifact(session_id, file_id, artifact).await?;
        self.get_text(&key).await
    }
}
