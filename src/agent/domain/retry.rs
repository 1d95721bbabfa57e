//! Retry policy with exponential backoff.

use std::time::Duration;

/// Number of attempts and backoff base for external calls.
///
/// The delay before attempt `n + 1` is `backoff_base ^ n` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1.5)
    }
}

impl RetryPolicy {
    /// Creates a policy making at most `max_retries` attempts (at least one).
    ///
    /// A non-finite or negative base disables backoff.
    #[must_use]
    pub fn new(max_retries: u32, backoff_base: f64) -> Self {
        let base = if backoff_base.is_finite() && backoff_base >= 0.0 {
            backoff_base
        } else {
            0.0
        };
        Self {
            max_retries: max_retries.max(1),
            backoff_base: base,
        }
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the backoff base in seconds.
    #[must_use]
    pub const fn backoff_base(&self) -> f64 {
        self.backoff_base
    }

    /// Returns the delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.backoff_base.powi(exponent)).unwrap_or(Duration::MAX)
    }

    /// Returns every delay of a fully failing run, in order.
    #[must_use]
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_retries)
            .map(|attempt| self.backoff_for(attempt))
            .collect()
    }
}

/// State of one retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `n` (1-based) is about to run or running.
    Attempting(u32),
    /// An attempt succeeded.
    Succeeded,
    /// Every attempt failed.
    Exhausted,
}

impl RetryState {
    /// Initial state.
    pub const START: Self = Self::Attempting(1);

    /// Returns the state after the current attempt finished.
    ///
    /// Final states are left unchanged.
    #[must_use]
    pub const fn after_attempt(self, policy: &RetryPolicy, succeeded: bool) -> Self {
        match self {
            Self::Attempting(_) if succeeded => Self::Succeeded,
            Self::Attempting(attempt) if attempt < policy.max_retries => {
                Self::Attempting(attempt.saturating_add(1))
            }
            Self::Attempting(_) => Self::Exhausted,
            terminal => terminal,
        }
    }

    /// Returns whether no further attempt will run.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted)
    }
}
