//! Hand-off from the bus consumer to the delivery task.

use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use super::DeliveryBridge;
use crate::bus::ports::{HandlerError, RecordHandler};
use crate::delivery::error::DeliveryError;
use crate::envelope::{Envelope, UserId, unwrap_or_adapt};

/// Default capacity of the hand-off channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Work item sent to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryCommand {
    /// Buffer and deliver an envelope.
    Deliver(Box<Envelope>),
    /// Flush whatever is buffered for a user.
    Flush(UserId),
}

/// Sending side of the bounded hand-off channel.
///
/// Cloned into the bus-facing record handler and the connection registry.
/// Sends wait while the channel is full.
#[derive(Debug, Clone)]
pub struct DeliveryHandle {
    sender: mpsc::Sender<DeliveryCommand>,
}

impl DeliveryHandle {
    /// Creates a handle and the receiver a [`DeliveryDispatcher`] consumes.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DeliveryCommand>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Hands an envelope to the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::DispatcherStopped`] when the dispatcher is gone.
    pub async fn deliver(&self, envelope: Envelope) -> Result<(), DeliveryError> {
        self.send(DeliveryCommand::Deliver(Box::new(envelope))).await
    }

    /// Asks the dispatcher to flush a user's buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::DispatcherStopped`] when the dispatcher is gone.
    pub async fn request_flush(&self, user_id: UserId) -> Result<(), DeliveryError> {
        self.send(DeliveryCommand::Flush(user_id)).await
    }

    async fn send(&self, command: DeliveryCommand) -> Result<(), DeliveryError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| DeliveryError::DispatcherStopped)
    }
}

/// Task that owns the receiving side of the hand-off channel.
///
/// Appends envelopes to user buffers in arrival order and runs flushes as
/// separate tasks, so a slow connection of one user does not hold up the
/// others.
pub struct DeliveryDispatcher<C: Clock + Send + Sync + 'static> {
    bridge: Arc<DeliveryBridge<C>>,
    commands: mpsc::Receiver<DeliveryCommand>,
    flushes: JoinSet<()>,
}

impl<C: Clock + Send + Sync + 'static> DeliveryDispatcher<C> {
    /// Creates a dispatcher draining `commands` into `bridge`.
    #[must_use]
    pub fn new(bridge: Arc<DeliveryBridge<C>>, commands: mpsc::Receiver<DeliveryCommand>) -> Self {
        Self {
            bridge,
            commands,
            flushes: JoinSet::new(),
        }
    }

    /// Processes commands until every handle is dropped or `shutdown` turns
    /// `true`, then waits for in-flight flushes.
    ///
    /// Returns the number of commands processed.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut processed = 0_usize;
        loop {
            self.reap_finished();
            if *shutdown.borrow_and_update() {
                break;
            }
            let command = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                command = self.commands.recv() => command,
            };
            let Some(next) = command else {
                break;
            };
            self.apply(next).await;
            processed = processed.saturating_add(1);
        }

        while let Some(result) = self.flushes.join_next().await {
            if let Err(err) = result {
                log_join_failure(&err);
            }
        }
        tracing::info!(processed, "delivery dispatcher stopped");
        processed
    }

    async fn apply(&mut self, command: DeliveryCommand) {
        match command {
            DeliveryCommand::Deliver(envelope) => {
                if let Some(user_id) = self.bridge.enqueue(*envelope).await {
                    self.spawn_flush(user_id);
                }
            }
            DeliveryCommand::Flush(user_id) => self.spawn_flush(user_id),
        }
    }

    fn spawn_flush(&mut self, user_id: UserId) {
        let bridge = Arc::clone(&self.bridge);
        self.flushes.spawn(async move {
            bridge.flush_user(&user_id).await;
        });
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.flushes.try_join_next() {
            if let Err(err) = result {
                log_join_failure(&err);
            }
        }
    }
}

fn log_join_failure(err: &tokio::task::JoinError) {
    tracing::error!(error = %err, "delivery flush task failed");
}

impl<C: Clock + Send + Sync + 'static> std::fmt::Debug for DeliveryDispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryDispatcher")
            .field("in_flight", &self.flushes.len())
            .finish_non_exhaustive()
    }
}

/// Record handler of the bridge's consume loop.
///
/// Adapts each record into an envelope and hands it to the dispatcher; it
/// never touches connections itself.
#[derive(Debug, Clone)]
pub struct BridgeRecordHandler {
    handle: DeliveryHandle,
}

impl BridgeRecordHandler {
    /// Creates a handler forwarding to `handle`.
    #[must_use]
    pub const fn new(handle: DeliveryHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl RecordHandler for BridgeRecordHandler {
    async fn handle(
        &self,
        topic: &str,
        payload: Value,
        _key: Option<&str>,
    ) -> Result<(), HandlerError> {
        let envelope = match unwrap_or_adapt(payload) {
            Ok((envelope, _)) => envelope,
            Err(err) => {
                tracing::warn!(topic, error = %err, "dropping undeliverable record");
                return Ok(());
            }
        };
        self.handle
            .deliver(envelope)
            .await
            .map_err(|err| HandlerError::new(err.to_string()))
    }
}
