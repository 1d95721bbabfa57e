//! Session store services.

mod documents;

pub use documents::{DEFAULT_TEXT_TTL, SessionDocumentStore};
