//! Structured logging initialisation.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Variable consulted when `RUST_LOG` is unset.
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Level used when neither variable is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Builds the filter from `RUST_LOG`, then `LOG_LEVEL`, then `info`.
///
/// An unparsable directive falls back to the default level.
#[must_use]
pub fn env_filter(lookup: impl Fn(&str) -> Option<String>) -> EnvFilter {
    let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let directive = non_blank(EnvFilter::DEFAULT_ENV)
        .or_else(|| non_blank(LOG_LEVEL_VAR))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
    EnvFilter::try_new(directive.to_lowercase())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Installs the global `fmt` subscriber.
///
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
#[must_use]
pub fn init_tracing() -> bool {
    let filter = env_filter(|name| std::env::var(name).ok());
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .is_ok()
}
