//! Per-record processing state machine.

use std::fmt;
use thiserror::Error;

/// Stage of one consumed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStage {
    /// Pulled from the bus.
    Received,
    /// Resolved into a well-formed envelope.
    Validated,
    /// Dispatched to a handler.
    Processing,
    /// Handled; downstream event published.
    Succeeded,
    /// Dropped or handled with an error.
    Failed,
}

impl RecordStage {
    /// Returns the stage name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the stage is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Validated)
                | (Self::Validated, Self::Processing)
                | (Self::Processing, Self::Succeeded)
                | (Self::Received | Self::Validated | Self::Processing, Self::Failed)
        )
    }
}

impl fmt::Display for RecordStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected stage transition.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot move a record from {from} to {to}")]
pub struct LifecycleError {
    /// Stage the record was in.
    pub from: RecordStage,
    /// Requested stage.
    pub to: RecordStage,
}

/// Lifecycle of one record: `Received -> Validated -> Processing ->
/// {Succeeded, Failed}`, where `Failed` is reachable from any non-final
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLifecycle {
    stage: RecordStage,
}

impl Default for RecordLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordLifecycle {
    /// Starts a lifecycle at [`RecordStage::Received`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stage: RecordStage::Received,
        }
    }

    /// Returns the current stage.
    #[must_use]
    pub const fn stage(&self) -> RecordStage {
        self.stage
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the transition is not allowed; the
    /// stage is left unchanged.
    pub const fn advance(&mut self, next: RecordStage) -> Result<(), LifecycleError> {
        if !self.stage.can_transition_to(next) {
            return Err(LifecycleError {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }
}
