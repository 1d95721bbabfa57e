//! In-memory object store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::agent::ports::{ObjectRef, ObjectStore, ObjectStoreError};

/// Thread-safe in-memory object store with failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<ObjectRef, Vec<u8>>>>,
    unavailable: Arc<AtomicBool>,
    fetches: Arc<AtomicUsize>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` at `object`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Unavailable`] when lock acquisition fails.
    pub fn insert(&self, object: ObjectRef, bytes: Vec<u8>) -> Result<(), ObjectStoreError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|err| ObjectStoreError::Unavailable(err.to_string()))?;
        objects.insert(object, bytes);
        Ok(())
    }

    /// Makes every subsequent fetch fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of fetch attempts made.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>, ObjectStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable("connection refused".to_owned()));
        }
        let objects = self
            .objects
            .read()
            .map_err(|err| ObjectStoreError::Unavailable(err.to_string()))?;
        objects
            .get(object)
            .cloned()
            .ok_or_else(|| ObjectStoreError::Missing(object.clone()))
    }
}
