//! Lexbus: an event-driven pipeline of document and chat agents.
//!
//! Uploaded documents and user chat messages enter the system as
//! [`envelope`]s on a partitioned [`bus`]. A parser extracts document text, a
//! legal agent analyses documents and answers follow-up questions, an
//! assistant answers chat messages and a validator reviews drafted replies.
//! Final events are fanned out to live user connections by the
//! [`delivery`] bridge with per-user ordering and buffering.
//!
//! # Architecture
//!
//! Lexbus follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`envelope`]: Canonical envelope format, validation and legacy adaptation
//! - [`bus`]: Publish, at-least-once consumption and the in-memory broker
//! - [`session`]: Active documents and stored text per chat session
//! - [`agent`]: Retry policy, prompts and the four processing agents
//! - [`delivery`]: Connection registry, delivery bridge, chat history, ingress
//! - [`config`]: Runtime configuration
//! - [`telemetry`]: Logging initialisation
//! - [`pipeline`]: Wiring of every consume loop into one process

pub mod agent;
pub mod bus;
pub mod config;
pub mod delivery;
pub mod envelope;
pub mod pipeline;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod test_support;
