//! Envelope domain types.

mod envelope;
mod ids;
mod incoming;

pub use envelope::{Envelope, EnvelopeBuilder, Payload, validate_value};
pub use ids::{CorrelationId, SessionId, UserId};
pub use incoming::{IncomingMessage, LegacyMessage, unwrap_or_adapt};
