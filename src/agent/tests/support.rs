//! Shared fixtures for agent tests.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::DefaultClock;
use mockall::mock;
use serde_json::Value;

use crate::agent::{
    adapters::sleeper::RecordingSleeper,
    domain::RetryPolicy,
    ports::{LanguageModel, LlmError, LlmRequest, LlmResponse},
    services::{AgentContext, PromptCatalog, RetryExecutor},
};
use crate::bus::{adapters::memory::InMemoryBus, services::EnvelopePublisher};
use crate::envelope::{CorrelationId, Envelope, SessionId, UserId};
use crate::session::{adapters::memory::InMemoryKeyValueStore, services::SessionDocumentStore};

mock! {
    pub Model {}

    #[async_trait]
    impl LanguageModel for Model {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;
    }
}

pub struct Harness {
    pub bus: InMemoryBus,
    pub store: InMemoryKeyValueStore<DefaultClock>,
    pub sleeper: RecordingSleeper,
    pub context: AgentContext,
}

impl Harness {
    pub fn new() -> Self {
        let bus = InMemoryBus::with_partitions(1);
        let store = InMemoryKeyValueStore::new(Arc::new(DefaultClock));
        let sleeper = RecordingSleeper::new();
        let context = AgentContext::new(
            EnvelopePublisher::new(Arc::new(bus.clone())),
            SessionDocumentStore::new(Arc::new(store.clone())),
            RetryExecutor::new(RetryPolicy::default(), Arc::new(sleeper.clone())),
            Arc::new(PromptCatalog::standard().expect("templates compile")),
        );
        Self {
            bus,
            store,
            sleeper,
            context,
        }
    }

    pub fn documents(&self) -> &SessionDocumentStore {
        self.context.documents()
    }

    pub fn events(&self, topic: &str) -> Vec<Envelope> {
        self.bus
            .values(topic)
            .expect("bus readable")
            .into_iter()
            .map(|value| serde_json::from_value(value).expect("published value is an envelope"))
            .collect()
    }

    pub fn single_event(&self, topic: &str) -> Envelope {
        let mut events = self.events(topic);
        assert_eq!(events.len(), 1, "expected exactly one event on {topic}");
        events.remove(0)
    }
}

pub fn session() -> SessionId {
    SessionId::new("s-1")
}

pub fn incoming(event: &str, payload: Value) -> Envelope {
    Envelope::builder("test", event)
        .user_id(Some(UserId::new("u-1")))
        .session_id(Some(session()))
        .correlation_id(CorrelationId::parse("corr-1").expect("non-empty"))
        .build(payload)
        .expect("valid envelope")
}
