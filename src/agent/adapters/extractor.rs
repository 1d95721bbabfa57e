//! Extractor for documents that already carry a text layer.

use async_trait::async_trait;

use crate::agent::ports::{DocumentKind, ExtractionError, TextExtractor};

/// Reads UTF-8 text straight out of the document bytes.
///
/// PDFs lose their header line; any other input must be valid UTF-8. Blank
/// results are failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8TextExtractor;

#[async_trait]
impl TextExtractor for Utf8TextExtractor {
    async fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = match kind {
            DocumentKind::Pdf => String::from_utf8_lossy(bytes)
                .lines()
                .skip(1)
                .collect::<Vec<_>>()
                .join("\n"),
            DocumentKind::Image => String::from_utf8(bytes.to_vec())
                .map_err(|_| ExtractionError("image has no readable text".to_owned()))?,
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ExtractionError("document has no text".to_owned()));
        }
        Ok(trimmed.to_owned())
    }
}
