//! The agents of the pipeline.

use std::fmt;

use crate::envelope::topics;

/// Identifies one of the processing agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    /// Extracts text from uploaded documents.
    Parser,
    /// Analyses documents and answers follow-up questions.
    Legal,
    /// Answers chat messages and formats analyses.
    Assistant,
    /// Approves or rejects drafted replies.
    Validator,
}

impl AgentKind {
    /// Every agent, in pipeline order.
    pub const ALL: [Self; 4] = [Self::Parser, Self::Legal, Self::Assistant, Self::Validator];

    /// Returns the `source` written into envelopes the agent emits.
    #[must_use]
    pub const fn source(self) -> &'static str {
        match self {
            Self::Parser => "parser",
            Self::Legal => "legal",
            Self::Assistant => "assistant",
            Self::Validator => "validator",
        }
    }

    /// Returns the consumer group of the agent.
    #[must_use]
    pub const fn group_id(self) -> &'static str {
        match self {
            Self::Parser => "parser-group",
            Self::Legal => "legal-group",
            Self::Assistant => "assistant-group",
            Self::Validator => "validator-group",
        }
    }

    /// Returns the topics the agent consumes.
    #[must_use]
    pub const fn topics(self) -> &'static [&'static str] {
        match self {
            Self::Parser => &[topics::DOCS_UPLOADED],
            Self::Legal => &[topics::DOCS_PARSED, topics::LEGAL_FOLLOWUP_REQUESTED],
            Self::Assistant => &[topics::ANALYSIS_COMPLETED, topics::USER_MESSAGE],
            Self::Validator => &[topics::DRAFT_CREATED],
        }
    }

    /// Returns whether the agent has a handler for `event`.
    #[must_use]
    pub fn handles(self, event: &str) -> bool {
        self.topics().contains(&event)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source())
    }
}
