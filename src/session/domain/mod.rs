//! Session store domain types.

mod keys;

pub use keys::{BlobKey, DocumentArtifact, FileId, TextScope, active_documents_key, artifact_key};
