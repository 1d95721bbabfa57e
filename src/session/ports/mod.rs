//! Port trait definitions for the session store.

mod store;

pub use store::KeyValueStore;
