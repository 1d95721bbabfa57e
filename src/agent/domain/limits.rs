//! Output size limits shared by the agents.

use serde::{Deserialize, Serialize};

/// Size bounds applied to prompts and published results.
///
/// All lengths count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentLimits {
    /// Maximum length of document or message text placed in a prompt.
    pub snippet_length: usize,
    /// Maximum length of a stored result also carried inline in events.
    pub inline_limit: usize,
    /// Inline bound for parsed text when it could not be stored.
    pub parser_fallback_limit: usize,
    /// Inline bound for replies and analyses when they could not be stored.
    pub reply_fallback_limit: usize,
    /// Token budget of a document analysis.
    pub analysis_max_tokens: u32,
    /// Token budget of a follow-up answer.
    pub followup_max_tokens: u32,
    /// Token budget of a chat reply.
    pub reply_max_tokens: u32,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self {
            snippet_length: 1000,
            inline_limit: 2000,
            parser_fallback_limit: 4000,
            reply_fallback_limit: 2000,
            analysis_max_tokens: 1500,
            followup_max_tokens: 1200,
            reply_max_tokens: 800,
        }
    }
}

/// Returns the first `limit` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
