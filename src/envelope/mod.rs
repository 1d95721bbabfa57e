//! Canonical envelope protocol carried by every bus event.
//!
//! Every record that crosses the bus is an [`domain::Envelope`]: routing
//! identity (`user_id`, `session_id`), a `correlation_id` minted once at
//! ingress and propagated unchanged, the producing `source`, a dotted `event`
//! name and a mapping `payload`.
//!
//! Older producers emit flat maps without that shape. They are resolved at
//! the boundary by [`domain::unwrap_or_adapt`], which classifies the raw value
//! as either a well-formed envelope or a legacy message and adapts the latter.
//!
//! # Example
//!
//! ```
//! use lexbus::envelope::domain::{Envelope, unwrap_or_adapt};
//! use serde_json::json;
//!
//! let envelope = Envelope::builder("frontend", "user.message")
//!     .build(json!({"text": "hello"}))
//!     .expect("payload is a mapping");
//!
//! let (adapted, correlation_id) =
//!     unwrap_or_adapt(envelope.to_value()).expect("well-formed envelope");
//! assert_eq!(adapted, envelope);
//! assert_eq!(&correlation_id, envelope.correlation_id());
//! ```

pub mod domain;
pub mod error;
pub mod topics;

pub use domain::{CorrelationId, Envelope, EnvelopeBuilder, SessionId, UserId, unwrap_or_adapt};
pub use error::ValidationError;

#[cfg(test)]
mod tests;
