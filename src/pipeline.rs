//! Wiring of the agents and the delivery bridge into one running process.
//!
//! [`Pipeline::spawn`] subscribes one consume loop per agent and one for the
//! delivery bridge on an [`InMemoryBus`], starts the delivery dispatcher and
//! returns handles to the ingress side ([`ChatGateway`]) and the
//! [`ConnectionRegistry`] transports register connections with.

use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::agent::{
    domain::AgentKind,
    ports::{LanguageModel, ObjectStore, Sleeper, TextExtractor},
    services::{
        Agent, AgentContext, AgentRuntime, AssistantAgent, LegalAgent, ParserAgent, PromptCatalog,
        PromptError, RetryExecutor, ValidatorAgent,
    },
};
use crate::bus::{
    adapters::memory::{InMemoryBus, InMemoryConsumer},
    error::{BusError, BusResult},
    ports::RecordHandler,
    services::{ConsumeLoop, ConsumeSettings, EnvelopePublisher},
};
use crate::config::RuntimeConfig;
use crate::delivery::{
    ports::ChatHistoryRepository,
    services::{
        BridgeRecordHandler, ChatGateway, ConnectionRegistry, DeliveryBridge, DeliveryDispatcher,
        DeliveryHandle,
    },
};
use crate::session::{ports::KeyValueStore, services::SessionDocumentStore};

/// Consumer group of the delivery bridge.
pub const BRIDGE_GROUP: &str = "delivery-bridge-group";

/// Errors raised while starting or stopping the pipeline.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A consumer could not be subscribed, or a loop ended with a poll error.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The prompt catalogue failed to compile.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// A background task panicked or was cancelled.
    #[error("pipeline task '{name}' failed: {reason}")]
    Task {
        /// Name of the task.
        name: String,
        /// Join failure.
        reason: String,
    },
}

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct PipelinePorts {
    /// Language model used by the legal and assistant agents.
    pub model: Arc<dyn LanguageModel>,
    /// Object storage holding uploads.
    pub objects: Arc<dyn ObjectStore>,
    /// Text extraction for uploaded documents.
    pub extractor: Arc<dyn TextExtractor>,
    /// Backoff sleeper of the retry executor.
    pub sleeper: Arc<dyn Sleeper>,
    /// Key-value store behind the session document store.
    pub store: Arc<dyn KeyValueStore>,
    /// Chat history repository.
    pub history: Arc<dyn ChatHistoryRepository>,
}

impl std::fmt::Debug for PipelinePorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelinePorts").finish_non_exhaustive()
    }
}

/// A running pipeline.
pub struct Pipeline<C: Clock + Send + Sync + 'static> {
    gateway: Arc<ChatGateway<C>>,
    registry: Arc<ConnectionRegistry>,
    bridge: Arc<DeliveryBridge<C>>,
    documents: SessionDocumentStore,
    shutdown: watch::Sender<bool>,
    loops: Vec<(String, JoinHandle<BusResult<()>>)>,
    dispatcher: JoinHandle<usize>,
}

impl<C: Clock + Send + Sync + 'static> Pipeline<C> {
    /// Subscribes every consumer and spawns the background tasks.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when the prompts fail to compile or a
    /// consumer cannot be subscribed. Nothing is left running in that case.
    pub fn spawn(
        config: &RuntimeConfig,
        bus: &InMemoryBus,
        ports: PipelinePorts,
        clock: Arc<C>,
    ) -> Result<Self, PipelineError> {
        let publisher = EnvelopePublisher::new(Arc::new(bus.clone()));
        let documents =
            SessionDocumentStore::new(Arc::clone(&ports.store)).with_ttl(config.store.text_ttl());
        let context = AgentContext::new(
            publisher.clone(),
            documents.clone(),
            RetryExecutor::new(config.retry.policy(), Arc::clone(&ports.sleeper)),
            Arc::new(PromptCatalog::standard()?),
        )
        .with_limits(config.agents.limits);

        let settings = config.bus.consume_settings();
        let delivery_topics: Vec<&str> =
            config.delivery.topics.iter().map(String::as_str).collect();
        let consumers = [
            subscribe_agent(bus, AgentKind::Parser)?,
            subscribe_agent(bus, AgentKind::Legal)?,
            subscribe_agent(bus, AgentKind::Assistant)?,
            subscribe_agent(bus, AgentKind::Validator)?,
        ];
        let bridge_consumer = bus.subscribe(&delivery_topics, BRIDGE_GROUP)?;

        let (handle, commands) = DeliveryHandle::channel(config.delivery.channel_capacity);
        let registry = Arc::new(ConnectionRegistry::with_flush_requests(handle.clone()));
        let bridge = Arc::new(
            DeliveryBridge::new(
                Arc::clone(&registry),
                Arc::clone(&ports.history),
                Arc::clone(&clock),
            )
            .with_buffer_limit(config.delivery.buffer_limit),
        );
        let gateway = Arc::new(ChatGateway::new(
            publisher,
            Arc::clone(&ports.history),
            clock,
        ));

        let (shutdown, shutdown_rx) = watch::channel(false);
        let [parser, legal, assistant, validator] = consumers;
        let loops = vec![
            spawn_agent(
                ParserAgent::new(
                    context.clone(),
                    Arc::clone(&ports.objects),
                    Arc::clone(&ports.extractor),
                ),
                parser,
                settings,
                shutdown_rx.clone(),
            ),
            spawn_agent(
                LegalAgent::new(context.clone(), Arc::clone(&ports.model)),
                legal,
                settings,
                shutdown_rx.clone(),
            ),
            spawn_agent(
                AssistantAgent::new(context.clone(), Arc::clone(&ports.model))
                    .with_draft_review(config.agents.review_drafts),
                assistant,
                settings,
                shutdown_rx.clone(),
            ),
            spawn_agent(
                ValidatorAgent::new(context, config.agents.draft_rules()),
                validator,
                settings,
                shutdown_rx.clone(),
            ),
            spawn_loop(
                ConsumeLoop::new("delivery-bridge", bridge_consumer, settings),
                BridgeRecordHandler::new(handle),
                shutdown_rx.clone(),
            ),
        ];
        let dispatcher =
            tokio::spawn(DeliveryDispatcher::new(Arc::clone(&bridge), commands).run(shutdown_rx));

        tracing::info!(
            partitions = bus.partitions(),
            delivery_topics = ?config.delivery.topics,
            "pipeline started"
        );
        Ok(Self {
            gateway,
            registry,
            bridge,
            documents,
            shutdown,
            loops,
            dispatcher,
        })
    }

    /// Returns the ingress gateway.
    #[must_use]
    pub const fn gateway(&self) -> &Arc<ChatGateway<C>> {
        &self.gateway
    }

    /// Returns the registry transports register live connections with.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Returns the delivery bridge.
    #[must_use]
    pub const fn bridge(&self) -> &Arc<DeliveryBridge<C>> {
        &self.bridge
    }

    /// Returns the session document store shared by the agents.
    #[must_use]
    pub const fn documents(&self) -> &SessionDocumentStore {
        &self.documents
    }

    /// Signals every task to stop and waits for them.
    ///
    /// Consume loops finish the record in progress first.
    ///
    /// # Errors
    ///
    /// Returns the first loop failure or task join failure.
    pub async fn shutdown(self) -> Result<(), PipelineError> {
        // Every task holds a receiver, so sending only fails if all have exited.
        if self.shutdown.send(true).is_err() {
            tracing::debug!("pipeline tasks already stopped");
        }
        let mut first_failure = None;
        for (name, task) in self.loops {
            let outcome = match task.await {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => PipelineError::Bus(err),
                Err(err) => PipelineError::Task {
                    name,
                    reason: err.to_string(),
                },
            };
            tracing::error!(error = %outcome, "pipeline task failed");
            first_failure.get_or_insert(outcome);
        }
        match self.dispatcher.await {
            Ok(processed) => tracing::info!(processed, "pipeline stopped"),
            Err(err) => {
                first_failure.get_or_insert(PipelineError::Task {
                    name: "delivery-dispatcher".to_owned(),
                    reason: err.to_string(),
                });
            }
        }
        first_failure.map_or(Ok(()), Err)
    }
}

impl<C: Clock + Send + Sync + 'static> std::fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("loops", &self.loops.len())
            .finish_non_exhaustive()
    }
}

fn subscribe_agent(bus: &InMemoryBus, kind: AgentKind) -> BusResult<InMemoryConsumer> {
    bus.subscribe(kind.topics(), kind.group_id())
}

fn spawn_agent<A: Agent + 'static>(
    agent: A,
    consumer: InMemoryConsumer,
    settings: ConsumeSettings,
    shutdown: watch::Receiver<bool>,
) -> (String, JoinHandle<BusResult<()>>) {
    let name = format!("{}-agent", agent.kind());
    spawn_loop(
        ConsumeLoop::new(name, consumer, settings),
        AgentRuntime::new(agent),
        shutdown,
    )
}

fn spawn_loop<H>(
    consume_loop: ConsumeLoop<InMemoryConsumer>,
    handler: H,
    shutdown: watch::Receiver<bool>,
) -> (String, JoinHandle<BusResult<()>>)
where
    H: RecordHandler + 'static,
{
    let name = consume_loop.name().to_owned();
    let task = tokio::spawn(async move { consume_loop.run(&handler, shutdown).await });
    (name, task)
}
