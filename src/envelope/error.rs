//! Validation errors raised at the envelope boundary.

use thiserror::Error;

/// Errors raised while creating, validating or adapting an envelope.
///
/// Records failing with any of these variants are logged and dropped by the
/// consumers; they are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The raw message is not a JSON object.
    #[error("message must be a mapping")]
    NotAMapping,

    /// A required envelope field is absent or null.
    #[error("envelope missing required field: {0}")]
    MissingField(&'static str),

    /// A required string field is present but empty.
    #[error("envelope field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// The payload is a scalar or a list instead of a mapping.
    #[error("envelope.payload must be a mapping")]
    PayloadNotMapping,

    /// A field has the wrong JSON type.
    #[error("envelope field '{field}' is malformed: {reason}")]
    Malformed {
        /// The offending field.
        field: &'static str,
        /// Description of the failure.
        reason: String,
    },
}

impl ValidationError {
    /// Creates a malformed-field error.
    #[must_use]
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }
}
