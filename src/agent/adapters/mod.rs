//! In-process adapters for the agents' ports.
//!
//! - [`language_model::EchoLanguageModel`] and
//!   [`language_model::ScriptedLanguageModel`]
//! - [`object_store::InMemoryObjectStore`]
//! - [`extractor::Utf8TextExtractor`]
//! - [`sleeper::TokioSleeper`] and [`sleeper::RecordingSleeper`]

pub mod extractor;
pub mod language_model;
pub mod object_store;
pub mod sleeper;
