//! Processing agents sharing one consume, process, produce pattern.
//!
//! Every agent consumes envelopes from its topics, performs at most one
//! fallible external call per record under a retry policy, stores large
//! results in the session store and publishes exactly one downstream event
//! (a success event or a `*.failed` event) carrying the incoming
//! correlation id.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::AgentKind`], the [`domain::RecordLifecycle`] state
//!   machine, [`domain::RetryPolicy`] and [`domain::RetryState`], output
//!   [`domain::AgentLimits`] and [`domain::DraftRules`]
//! - **Ports**: [`ports::LanguageModel`], [`ports::ObjectStore`],
//!   [`ports::TextExtractor`] and [`ports::Sleeper`]
//! - **Adapters**: in-process implementations of every port
//! - **Services**: [`services::AgentRuntime`] (the record handler shared by
//!   all agents), [`services::RetryExecutor`], [`services::PromptCatalog`]
//!   and the four agents

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
