//! Backoff sleeping port.

use async_trait::async_trait;
use std::time::Duration;

/// Waits between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}
