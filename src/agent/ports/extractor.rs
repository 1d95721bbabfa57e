//! Text extraction port.

use async_trait::async_trait;
use thiserror::Error;

/// Format of an uploaded document, decided by its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Bytes start with the `%PDF` magic.
    Pdf,
    /// Anything else is treated as an image.
    Image,
}

impl DocumentKind {
    /// Detects the kind of `bytes`.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"%PDF") {
            Self::Pdf
        } else {
            Self::Image
        }
    }
}

/// Extraction failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("text extraction failed: {0}")]
pub struct ExtractionError(pub String);

/// Converts document bytes into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extracts the text of a document of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] when no text can be recovered.
    async fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError>;
}
