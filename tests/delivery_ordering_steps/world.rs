//! World state for delivery ordering scenarios.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lexbus::delivery::{
    adapters::memory::InMemoryChatHistory,
    domain::{ConnectionId, DEFAULT_BUFFER_LIMIT, OutboundMessage},
    error::DeliveryError,
    ports::LiveConnection,
    services::{ConnectionRegistry, DeliveryBridge},
};
use lexbus::envelope::{Envelope, UserId, topics};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::json;

/// Connection that records replies and can refuse chosen texts once.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    id: ConnectionId,
    received: Mutex<Vec<String>>,
    refuse_once: Mutex<Vec<String>>,
}

impl RecordingConnection {
    pub fn refusing(text: &str) -> Self {
        Self {
            refuse_once: Mutex::new(vec![text.to_owned()]),
            ..Self::default()
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|texts| texts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LiveConnection for RecordingConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let text = message.reply().unwrap_or_default().to_owned();
        if let Ok(mut refusals) = self.refuse_once.lock()
            && let Some(position) = refusals.iter().position(|candidate| *candidate == text)
        {
            refusals.remove(position);
            return Err(DeliveryError::Send {
                connection: self.id,
                reason: format!("refused {text}"),
            });
        }
        if let Ok(mut received) = self.received.lock() {
            received.push(text);
        }
        Ok(())
    }
}

/// World state for delivery ordering BDD tests.
pub struct DeliveryWorld {
    pub registry: Arc<ConnectionRegistry>,
    pub history: InMemoryChatHistory,
    pub bridge: DeliveryBridge<DefaultClock>,
    pub connections: HashMap<String, Arc<RecordingConnection>>,
}

impl DeliveryWorld {
    /// Rebuilds the bridge with a different buffer bound.
    pub fn set_buffer_limit(&mut self, limit: usize) {
        self.bridge = build_bridge(&self.registry, &self.history, limit);
    }

    pub fn connection(&self, name: &str) -> Result<&Arc<RecordingConnection>, eyre::Report> {
        self.connections
            .get(name)
            .ok_or_else(|| eyre::eyre!("no connection named {name} in scenario world"))
    }

    /// Registers `connection` for `user` under a scenario-local name.
    pub fn open_connection(&mut self, user: &str, name: String, connection: RecordingConnection) {
        let connection = Arc::new(connection);
        let live: Arc<dyn LiveConnection> = connection.clone();
        run_async(self.registry.register(&UserId::new(user), live));
        self.connections.insert(name, connection);
    }

    pub fn buffered_texts(&self, user_id: &UserId) -> Vec<String> {
        run_async(self.bridge.buffered(user_id))
            .iter()
            .filter_map(|message| message.reply().map(str::to_owned))
            .collect()
    }
}

impl Default for DeliveryWorld {
    fn default() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let history = InMemoryChatHistory::new();
        let bridge = build_bridge(&registry, &history, DEFAULT_BUFFER_LIMIT);
        Self {
            registry,
            history,
            bridge,
            connections: HashMap::new(),
        }
    }
}

fn build_bridge(
    registry: &Arc<ConnectionRegistry>,
    history: &InMemoryChatHistory,
    limit: usize,
) -> DeliveryBridge<DefaultClock> {
    DeliveryBridge::new(
        Arc::clone(registry),
        Arc::new(history.clone()),
        Arc::new(DefaultClock),
    )
    .with_buffer_limit(limit)
}

/// Builds an assistant reply addressed to `user_id`.
pub fn reply_for(user_id: &UserId, text: &str) -> Result<Envelope, eyre::Report> {
    Envelope::builder("assistant", topics::ASSISTANT_REPLY_COMPLETED)
        .user_id(Some(user_id.clone()))
        .build(json!({ "text": text }))
        .map_err(eyre::Report::from)
}

/// Splits a comma separated list of message texts.
pub fn split_texts(texts: &str) -> Vec<String> {
    texts
        .split(',')
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
        .collect()
}

#[fixture]
pub fn world() -> DeliveryWorld {
    DeliveryWorld::default()
}

pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
