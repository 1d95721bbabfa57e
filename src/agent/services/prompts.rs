//! Prompt templates.

use minijinja::{Environment, ErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Templates that a `menu` follow-up may name directly.
pub const MENU_ITEMS: [&str; 2] = ["legal_review", "contract_summary"];

const TEMPLATES: [(&str, &str); 5] = [
    (
        "legal_review",
        "Role: lawyer.\n\
         You are given a document: {{ snippet }}\n\
         Give a short review covering key provisions, risks and recommendations \
         (no more than 300 words).",
    ),
    (
        "contract_summary",
        "Role: lawyer and contract analyst.\n\
         List the key obligations and deadlines of the document: {{ snippet }}",
    ),
    (
        "legal_followup",
        "Follow-up question: {{ query }}\n\
         {% for doc in documents %}Document {{ doc.file_id }}: {{ doc.text }}\n\
         Previous analysis: {{ doc.analysis }}\n\
         {% endfor %}",
    ),
    (
        "assistant_reply",
        "You are a helpful legal assistant. Reply to the user.\n\
         User: {{ snippet }}",
    ),
    (
        "analysis_reply",
        "Here is what I found:\n\n\
         {{ analysis }}\n\n\
         I can explain in more detail or draft a conclusion if you like.",
    ),
];

/// Template lookup or rendering failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    /// No template has the requested name.
    #[error("unknown prompt template '{0}'")]
    UnknownTemplate(String),
    /// The template failed to compile or render.
    #[error("failed to render prompt '{name}': {reason}")]
    Render {
        /// Template name.
        name: String,
        /// Engine diagnostic.
        reason: String,
    },
}

/// Named prompt templates rendered with `minijinja`.
pub struct PromptCatalog {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptCatalog").finish_non_exhaustive()
    }
}

impl PromptCatalog {
    /// Creates a catalogue holding the standard templates.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Render`] when a template fails to compile.
    pub fn standard() -> Result<Self, PromptError> {
        TEMPLATES
            .into_iter()
            .try_fold(Self::empty(), |catalog, (name, source)| {
                catalog.with_template(name, source)
            })
    }

    fn empty() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Adds or replaces a template.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Render`] when the template fails to compile.
    pub fn with_template(
        mut self,
        name: &'static str,
        source: &'static str,
    ) -> Result<Self, PromptError> {
        self.env
            .add_template(name, source)
            .map_err(|err| PromptError::Render {
                name: name.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(self)
    }

    /// Returns whether `name` may be requested as a menu item.
    #[must_use]
    pub fn is_menu_item(&self, name: &str) -> bool {
        MENU_ITEMS.contains(&name) && self.env.get_template(name).is_ok()
    }

    /// Renders template `name` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::UnknownTemplate`] for unknown names and
    /// [`PromptError::Render`] when rendering fails.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, PromptError> {
        let template = self.env.get_template(name).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                PromptError::UnknownTemplate(name.to_owned())
            } else {
                PromptError::Render {
                    name: name.to_owned(),
                    reason: err.to_string(),
                }
            }
        })?;
        template.render(context).map_err(|err| PromptError::Render {
            name: name.to_owned(),
            reason: err.to_string(),
        })
    }
}
