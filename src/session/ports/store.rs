//! Key-value store port.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::session::error::StoreResult;

/// String and set storage with optional expiry.
///
/// A `ttl` of `None` stores without expiry. Writing refreshes the expiry of
/// the whole key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Adds `member` to the set at `key`, returning whether it was new.
    async fn set_add(&self, key: &str, member: &str, ttl: Option<Duration>) -> StoreResult<bool>;

    /// Returns the members of the set at `key` (empty when absent).
    async fn set_members(&self, key: &str) -> StoreResult<BTreeSet<String>>;

    /// Returns whether `member` belongs to the set at `key`.
    async fn set_contains(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Stores `value` at `key`.
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Returns the string at `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
}
