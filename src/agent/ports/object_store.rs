//! Object storage port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Bucket name.
    pub bucket: String,
    /// Object identifier within the bucket.
    pub object_id: String,
}

impl ObjectRef {
    /// Creates a reference.
    #[must_use]
    pub fn new(bucket: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            object_id: object_id.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.object_id)
    }
}

/// Failure of one object fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectStoreError {
    /// The store could not be reached.
    #[error("object store unavailable: {0}")]
    Unavailable(String),
    /// No object exists at the reference.
    #[error("object {0} not found")]
    Missing(ObjectRef),
}

/// Read access to uploaded objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches the bytes of `object`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the fetch fails.
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>, ObjectStoreError>;
}
