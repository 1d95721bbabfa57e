//! Runtime configuration.
//!
//! Every setting has a default, so an empty JSON object or an empty
//! environment yields a working configuration. Environment variables override
//! individual fields:
//!
//! | Variable                | Field                        |
//! |-------------------------|------------------------------|
//! | `LLM_RETRIES`           | `retry.max_retries`          |
//! | `RETRY_BACKOFF_BASE`    | `retry.backoff_base`         |
//! | `EXPIRE_TIME`           | `store.text_ttl_secs`        |
//! | `SNIPPET_LENGTH`        | `agents.snippet_length`      |
//! | `DELIVERY_BUFFER_LIMIT` | `delivery.buffer_limit`      |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::agent::domain::{AgentLimits, DraftRules, RetryPolicy};
use crate::bus::services::ConsumeSettings;
use crate::delivery::{domain::DEFAULT_BUFFER_LIMIT, services::DEFAULT_CHANNEL_CAPACITY};
use crate::envelope::topics::DEFAULT_DELIVERY_TOPICS;
use crate::session::services::DEFAULT_TEXT_TTL;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unparsable value.
    #[error("invalid value '{value}' for {variable}: {reason}")]
    InvalidVariable {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A field is outside its accepted range.
    #[error("invalid setting {field}: {reason}")]
    OutOfRange {
        /// Dotted field path.
        field: &'static str,
        /// What the field must satisfy.
        reason: &'static str,
    },

    /// The JSON document could not be parsed.
    #[error("invalid configuration document: {0}")]
    Document(String),
}

/// Bus and consume loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    /// Partitions per topic of the in-memory broker.
    pub partitions: u32,
    /// Upper bound of a single poll in milliseconds.
    pub poll_timeout_ms: u64,
    /// Handler failures tolerated for one record before it is skipped.
    pub max_redeliveries: u32,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            partitions: 3,
            poll_timeout_ms: 1000,
            max_redeliveries: 5,
        }
    }
}

impl BusSettings {
    /// Returns the consume loop tunables.
    #[must_use]
    pub const fn consume_settings(&self) -> ConsumeSettings {
        ConsumeSettings {
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            max_redeliveries: self.max_redeliveries,
        }
    }
}

/// Retry settings for external calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Attempts per external call.
    pub max_retries: u32,
    /// Backoff base in seconds.
    pub backoff_base: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries(),
            backoff_base: policy.backoff_base(),
        }
    }
}

impl RetrySettings {
    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_base)
    }
}

/// Session store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Lifetime of stored text and session sets in seconds.
    pub text_ttl_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            text_ttl_secs: DEFAULT_TEXT_TTL.as_secs(),
        }
    }
}

impl StoreSettings {
    /// Returns the text lifetime.
    #[must_use]
    pub const fn text_ttl(&self) -> Duration {
        Duration::from_secs(self.text_ttl_secs)
    }
}

/// Agent behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Prompt and payload size limits.
    #[serde(flatten)]
    pub limits: AgentLimits,
    /// Words the validator rejects.
    pub forbidden_terms: Vec<String>,
    /// Shortest draft the validator accepts.
    pub min_draft_length: usize,
    /// Route assistant replies through the validator.
    pub review_drafts: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        let rules = DraftRules::default();
        Self {
            limits: AgentLimits::default(),
            forbidden_terms: rules.forbidden_terms,
            min_draft_length: rules.min_length,
            review_drafts: false,
        }
    }
}

impl AgentSettings {
    /// Returns the validator's rules.
    #[must_use]
    pub fn draft_rules(&self) -> DraftRules {
        DraftRules {
            forbidden_terms: self.forbidden_terms.clone(),
            min_length: self.min_draft_length,
        }
    }
}

/// Delivery bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySettings {
    /// Messages buffered per offline user.
    pub buffer_limit: usize,
    /// Capacity of the bus-to-dispatcher channel.
    pub channel_capacity: usize,
    /// Topics forwarded to live connections.
    pub topics: Vec<String>,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            topics: DEFAULT_DELIVERY_TOPICS
                .iter()
                .map(|topic| (*topic).to_owned())
                .collect(),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bus settings.
    pub bus: BusSettings,
    /// Retry settings.
    pub retry: RetrySettings,
    /// Session store settings.
    pub store: StoreSettings,
    /// Agent settings.
    pub agents: AgentSettings,
    /// Delivery settings.
    pub delivery: DeliverySettings,
}

impl RuntimeConfig {
    /// Loads defaults overridden by the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads defaults overridden by variables resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparsable or out-of-range values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = parse_var(&lookup, "LLM_RETRIES")? {
            config.retry.max_retries = value;
        }
        if let Some(value) = parse_var(&lookup, "RETRY_BACKOFF_BASE")? {
            config.retry.backoff_base = value;
        }
        if let Some(value) = parse_var(&lookup, "EXPIRE_TIME")? {
            config.store.text_ttl_secs = value;
        }
        if let Some(value) = parse_var(&lookup, "SNIPPET_LENGTH")? {
            config.agents.limits.snippet_length = value;
        }
        if let Some(value) = parse_var(&lookup, "DELIVERY_BUFFER_LIMIT")? {
            config.delivery.buffer_limit = value;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Document`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for invalid values.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|err| ConfigError::Document(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(bool, &'static str, &'static str); 7] = [
            (self.bus.partitions >= 1, "bus.partitions", "must be at least 1"),
            (self.retry.max_retries >= 1, "retry.max_retries", "must be at least 1"),
            (
                self.retry.backoff_base.is_finite() && self.retry.backoff_base >= 0.0,
                "retry.backoff_base",
                "must be a finite, non-negative number",
            ),
            (self.store.text_ttl_secs >= 1, "store.text_ttl_secs", "must be at least 1"),
            (self.agents.limits.snippet_length >= 1, "agents.snippet_length", "must be at least 1"),
            (self.delivery.buffer_limit >= 1, "delivery.buffer_limit", "must be at least 1"),
            (
                self.delivery.channel_capacity >= 1 && !self.delivery.topics.is_empty(),
                "delivery",
                "needs a positive channel capacity and at least one topic",
            ),
        ];
        match checks.into_iter().find(|(valid, _, _)| !valid) {
            Some((_, field, reason)) => Err(ConfigError::OutOfRange { field, reason }),
            None => Ok(()),
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(variable) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|err: T::Err| ConfigError::InvalidVariable {
            variable,
            value: raw.clone(),
            reason: err.to_string(),
        })
}
