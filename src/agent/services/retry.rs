//! Retry executor for external calls.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::agent::{
    domain::{RetryPolicy, RetryState},
    error::{AgentError, AgentResult},
    ports::Sleeper,
};

/// Runs a fallible operation under a [`RetryPolicy`].
///
/// Backoff sleeps block the caller; there is no mid-retry cancellation.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Calls `attempt` until it succeeds or the policy is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UpstreamUnavailable`] carrying the last failure
    /// after exactly `max_retries` failed attempts.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt: F) -> AgentResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Display,
        T: Send,
    {
        let mut state = RetryState::START;
        let mut last_failure = String::new();
        while let RetryState::Attempting(number) = state {
            match attempt().await {
                Ok(value) => {
                    if number > 1 {
                        tracing::info!(operation, attempt = number, "external call recovered");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    last_failure = err.to_string();
                    state = state.after_attempt(&self.policy, false);
                    if state.is_terminal() {
                        tracing::error!(
                            operation,
                            attempt = number,
                            error = %last_failure,
                            "external call failed; retries exhausted"
                        );
                    } else {
                        let delay = self.policy.backoff_for(number);
                        tracing::warn!(
                            operation,
                            attempt = number,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %last_failure,
                            "external call failed; backing off"
                        );
                        self.sleeper.sleep(delay).await;
                    }
                }
            }
        }

        Err(AgentError::UpstreamUnavailable {
            operation: operation.to_owned(),
            attempts: self.policy.max_retries(),
            reason: last_failure,
        })
    }
}
