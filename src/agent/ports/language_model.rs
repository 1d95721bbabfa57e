//! Language model port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Rendered prompt.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Tracing metadata forwarded to the provider.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl LlmRequest {
    /// Creates a request without metadata.
    #[must_use]
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            metadata: Map::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }
}

/// A completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text.
    pub text: String,
    /// Provider-side identifier, if any.
    #[serde(default)]
    pub id: Option<String>,
}

impl LlmResponse {
    /// Creates a response carrying only text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            id: None,
        }
    }
}

/// Failure of one completion attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// The provider could not be reached or returned an error status.
    #[error("language model request failed: {0}")]
    Request(String),
    /// The provider answered with no text.
    #[error("language model returned an empty completion")]
    Empty,
}

/// Text completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Completes `request`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when the attempt fails.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;
}
