//! Session-scoped document state.
//!
//! Tracks which documents are active for a chat session and stores large
//! text results (extracted documents, analyses, replies) under generated
//! keys with a time-to-live.
//!
//! - **Domain**: [`domain::TextScope`], [`domain::BlobKey`], [`domain::FileId`]
//! - **Ports**: [`ports::KeyValueStore`], the set/string store with expiry
//! - **Adapters**: [`adapters::memory::InMemoryKeyValueStore`]
//! - **Services**: [`services::SessionDocumentStore`]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
