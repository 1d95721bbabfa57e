//! Key layout of the session store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use crate::envelope::{CorrelationId, SessionId};

/// Placeholder used in keys when no session is known.
const NO_SESSION: &str = "-";

/// Identifier of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Wraps a file identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Key under which a stored text blob lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
    /// Wraps an existing key, such as one carried in an event payload.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a stored text blob belongs to.
///
/// The scope determines the key prefix; every saved blob also receives a
/// random suffix so repeated saves never overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextScope {
    /// Extracted text of an uploaded document.
    DocumentText {
        /// Owning session, if known.
        session_id: Option<SessionId>,
        /// Source document.
        file_id: FileId,
    },
    /// Legal analysis of a document.
    Analysis {
        /// Owning session, if known.
        session_id: Option<SessionId>,
        /// Analysed document.
        file_id: FileId,
    },
    /// Reply produced by the assistant for one request.
    AssistantReply {
        /// Owning session, if known.
        session_id: Option<SessionId>,
        /// Request the reply answers.
        correlation_id: CorrelationId,
    },
    /// Answer to a follow-up question about one or more documents.
    Followup {
        /// Owning session, if known.
        session_id: Option<SessionId>,
        /// The question asked.
        query: String,
    },
}

impl TextScope {
    /// Returns the key prefix of the scope.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::DocumentText { .. } => "doc:text",
            Self::Analysis { .. } => "analysis",
            Self::AssistantReply { .. } => "llm_assistant_response",
            Self::Followup { .. } => "doc:followup",
        }
    }

    /// Builds a fresh, unique key inside the scope.
    #[must_use]
    pub fn generate_key(&self) -> BlobKey {
        let (session_id, subject) = match self {
            Self::DocumentText {
                session_id,
                file_id,
            }
            | Self::Analysis {
                session_id,
                file_id,
            } => (session_id, file_id.as_str().to_owned()),
            Self::AssistantReply {
                session_id,
                correlation_id,
            } => (session_id, correlation_id.as_str().to_owned()),
            Self::Followup { session_id, query } => (session_id, query_digest(query)),
        };
        let session = session_id.as_ref().map_or(NO_SESSION, SessionId::as_str);
        BlobKey(format!(
            "{}:{session}:{subject}:{}",
            self.prefix(),
            Uuid::new_v4().simple()
        ))
    }
}

fn query_digest(query: &str) -> String {
    Sha256::digest(query.as_bytes())
        .iter()
        .take(8)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Kinds of per-document results a session can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentArtifact {
    /// Extracted text.
    Text,
    /// Legal analysis.
    Analysis,
}

impl DocumentArtifact {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Analysis => "analysis",
        }
    }
}

/// Key of the active-document set of a session.
#[must_use]
pub fn active_documents_key(session_id: &SessionId) -> String {
    format!("session:{session_id}:active_docs")
}

/// Key of the pointer from a session's document to its latest artifact.
#[must_use]
pub fn artifact_key(
    session_id: &SessionId,
    file_id: &FileId,
    artifact: DocumentArtifact,
) -> String {
    format!("session:{session_id}:doc:{file_id}:{}", artifact.suffix())
}
