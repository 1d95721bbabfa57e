//! Content rules for drafted replies.

use serde::{Deserialize, Serialize};

/// Outcome of checking a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftVerdict {
    /// The draft may be published.
    Approved,
    /// The draft must not be published.
    Rejected {
        /// Why the draft was rejected.
        reason: String,
    },
}

impl DraftVerdict {
    /// Returns whether the draft was approved.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Rules a draft must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftRules {
    /// Words that must not appear (whole-word, case-insensitive).
    pub forbidden_terms: Vec<String>,
    /// Minimum length of the trimmed draft in characters.
    pub min_length: usize,
}

impl Default for DraftRules {
    fn default() -> Self {
        Self {
            forbidden_terms: vec![
                "illegally".to_owned(),
                "secret".to_owned(),
                "password".to_owned(),
            ],
            min_length: 10,
        }
    }
}

impl DraftRules {
    /// Checks `draft`: emptiness first, then forbidden terms, then length.
    #[must_use]
    pub fn check(&self, draft: &str) -> DraftVerdict {
        let trimmed = draft.trim();
        if trimmed.is_empty() {
            return DraftVerdict::Rejected {
                reason: "draft is empty".to_owned(),
            };
        }

        if let Some(term) = self.forbidden_term_in(trimmed) {
            return DraftVerdict::Rejected {
                reason: format!("draft contains forbidden term '{term}'"),
            };
        }

        if trimmed.chars().count() < self.min_length {
            return DraftVerdict::Rejected {
                reason: format!("draft is shorter than {} characters", self.min_length),
            };
        }

        DraftVerdict::Approved
    }

    fn forbidden_term_in(&self, text: &str) -> Option<&str> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect();
        self.forbidden_terms
            .iter()
            .map(String::as_str)
            .find(|term| words.iter().any(|word| *word == term.to_lowercase()))
    }
}
