//! Port trait definitions for the agents' external collaborators.

pub mod extractor;
pub mod language_model;
pub mod object_store;
pub mod sleeper;

pub use extractor::{DocumentKind, ExtractionError, TextExtractor};
pub use language_model::{LanguageModel, LlmError, LlmRequest, LlmResponse};
pub use object_store::{ObjectRef, ObjectStore, ObjectStoreError};
pub use sleeper::Sleeper;
