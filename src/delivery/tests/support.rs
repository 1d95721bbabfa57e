//! Shared fixtures for delivery tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::delivery::{
    adapters::memory::InMemoryChatHistory,
    domain::{ConnectionId, OutboundMessage},
    error::DeliveryError,
    ports::LiveConnection,
    services::{ConnectionRegistry, DeliveryBridge},
};
use crate::envelope::{Envelope, UserId, topics};
use crate::test_support::ManualClock;

/// Connection that records what it receives and fails on request.
#[derive(Debug, Default)]
pub struct FlakyConnection {
    id: ConnectionId,
    received: Mutex<Vec<String>>,
    fail_once_on: Mutex<Vec<String>>,
}

impl FlakyConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_once_on(&self, text: &str) {
        self.fail_once_on
            .lock()
            .expect("failure lock")
            .push(text.to_owned());
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("received lock").clone()
    }
}

#[async_trait]
impl LiveConnection for FlakyConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let text = message.reply().unwrap_or_default().to_owned();
        {
            let mut failures = self.fail_once_on.lock().expect("failure lock");
            if let Some(position) = failures.iter().position(|candidate| *candidate == text) {
                failures.remove(position);
                return Err(DeliveryError::Send {
                    connection: self.id,
                    reason: format!("refused {text}"),
                });
            }
        }
        self.received.lock().expect("received lock").push(text);
        Ok(())
    }
}

pub fn user() -> UserId {
    UserId::new("u-1")
}

pub fn reply_for(user_id: &UserId, text: &str) -> Envelope {
    Envelope::builder("assistant", topics::ASSISTANT_REPLY_COMPLETED)
        .user_id(Some(user_id.clone()))
        .build(json!({ "text": text }))
        .expect("valid reply envelope")
}

pub struct BridgeHarness {
    pub registry: Arc<ConnectionRegistry>,
    pub history: InMemoryChatHistory,
    pub bridge: DeliveryBridge<ManualClock>,
}

impl BridgeHarness {
    pub fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let history = InMemoryChatHistory::new();
        let bridge = DeliveryBridge::new(
            Arc::clone(&registry),
            Arc::new(history.clone()),
            Arc::new(ManualClock::new()),
        );
        Self {
            registry,
            history,
            bridge,
        }
    }

    pub fn with_buffer_limit(self, limit: usize) -> Self {
        Self {
            bridge: self.bridge.with_buffer_limit(limit),
            ..self
        }
    }

    pub async fn buffered_texts(&self, user_id: &UserId) -> Vec<String> {
        self.bridge
            .buffered(user_id)
            .await
            .iter()
            .filter_map(|message| message.reply().map(str::to_owned))
            .collect()
    }
}
