//! Agent domain types.

mod draft;
mod kind;
mod lifecycle;
mod limits;
mod retry;

pub use draft::{DraftRules, DraftVerdict};
pub use kind::AgentKind;
pub use lifecycle::{LifecycleError, RecordLifecycle, RecordStage};
pub use limits::{AgentLimits, truncate_chars};
pub use retry::{RetryPolicy, RetryState};
