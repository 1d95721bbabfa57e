//! Fan-out of bus events to live user connections.

use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::ConnectionRegistry;
use crate::delivery::{
    domain::{DEFAULT_BUFFER_LIMIT, DeliveryBuffer, FlushReport, HistoryEntry, OutboundMessage},
    error::DeliveryError,
    ports::{ChatHistoryRepository, LiveConnection},
};
use crate::envelope::{Envelope, UserId};

/// Buffer and flush guard of one user.
#[derive(Debug)]
struct UserQueue {
    buffer: Mutex<DeliveryBuffer>,
    flushing: Mutex<()>,
}

impl UserQueue {
    fn new(limit: usize) -> Self {
        Self {
            buffer: Mutex::new(DeliveryBuffer::new(limit)),
            flushing: Mutex::new(()),
        }
    }
}

/// Buffers outbound messages per user and flushes them, in order, to every
/// live connection of the user.
///
/// Flushes of one user are serialised; flushes of different users run
/// independently.
pub struct DeliveryBridge<C: Clock + Send + Sync> {
    registry: Arc<ConnectionRegistry>,
    history: Arc<dyn ChatHistoryRepository>,
    clock: Arc<C>,
    buffer_limit: usize,
    queues: Mutex<HashMap<UserId, Arc<UserQueue>>>,
}

impl<C: Clock + Send + Sync> DeliveryBridge<C> {
    /// Creates a bridge with the default buffer bound.
    #[must_use]
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        history: Arc<dyn ChatHistoryRepository>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            registry,
            history,
            clock,
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            queues: Mutex::default(),
        }
    }

    /// Overrides the per-user buffer bound.
    #[must_use]
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit.max(1);
        self
    }

    /// Returns the per-user buffer bound.
    #[must_use]
    pub const fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Returns the registry the bridge delivers through.
    #[must_use]
    pub const fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Records an envelope and appends it to its user's buffer.
    ///
    /// Returns the addressed user, or `None` when the envelope carries no
    /// user and was dropped.
    pub async fn enqueue(&self, envelope: Envelope) -> Option<UserId> {
        let Some(user_id) = envelope.user_id().cloned() else {
            tracing::debug!(
                event = envelope.event(),
                correlation_id = %envelope.correlation_id(),
                "dropping envelope without user"
            );
            return None;
        };
        let message = OutboundMessage::from_envelope(envelope);
        self.record_history(&user_id, &message).await;

        let queue = self.queue(&user_id).await;
        let evicted = queue.buffer.lock().await.push_back(message);
        log_evicted(&user_id, &evicted);
        Some(user_id)
    }

    /// Enqueues an envelope and immediately flushes its user's buffer.
    ///
    /// Returns `None` when the envelope carries no user.
    pub async fn accept(&self, envelope: Envelope) -> Option<FlushReport> {
        let user_id = self.enqueue(envelope).await?;
        Some(self.flush_user(&user_id).await)
    }

    /// Delivers everything buffered for a user.
    ///
    /// Pops the whole buffer and sends each message, in order, to every live
    /// connection. On the first failure the failed message and everything
    /// behind it go back to the head of the buffer, ahead of anything that
    /// arrived meanwhile. Without live connections nothing is popped.
    ///
    /// A user whose buffer ends up empty is forgotten once no other task
    /// holds its queue.
    pub async fn flush_user(&self, user_id: &UserId) -> FlushReport {
        let queue = self.queue(user_id).await;
        let report = self.flush_queue(user_id, &queue).await;
        drop(queue);
        self.release_if_idle(user_id).await;
        report
    }

    /// Returns how many users currently have a queue.
    pub async fn tracked_users(&self) -> usize {
        self.queues.lock().await.len()
    }

    async fn flush_queue(&self, user_id: &UserId, queue: &UserQueue) -> FlushReport {
        let _flushing = queue.flushing.lock().await;

        let connections = self.registry.list(user_id).await;
        if connections.is_empty() {
            let pending = queue.buffer.lock().await.len();
            tracing::debug!(user_id = %user_id, pending, "no live connection; keeping buffer");
            return FlushReport {
                delivered: 0,
                pending,
                interrupted: false,
            };
        }

        let batch = queue.buffer.lock().await.drain();
        let mut delivered = 0_usize;
        let mut remaining = batch.into_iter();
        while let Some(message) = remaining.next() {
            if let Err(err) = send_to_all(&connections, &message).await {
                let mut undelivered = vec![message];
                undelivered.extend(remaining);
                let requeued = undelivered.len();
                let mut buffer = queue.buffer.lock().await;
                let evicted = buffer.requeue_front(undelivered);
                log_evicted(user_id, &evicted);
                tracing::warn!(
                    user_id = %user_id,
                    delivered,
                    requeued,
                    error = %err,
                    "delivery interrupted; remainder re-queued"
                );
                return FlushReport {
                    delivered,
                    pending: buffer.len(),
                    interrupted: true,
                };
            }
            delivered = delivered.saturating_add(1);
        }

        let pending = queue.buffer.lock().await.len();
        if delivered > 0 {
            tracing::debug!(user_id = %user_id, delivered, pending, "buffer flushed");
        }
        FlushReport {
            delivered,
            pending,
            interrupted: false,
        }
    }

    /// Returns the messages currently buffered for a user, in order.
    pub async fn buffered(&self, user_id: &UserId) -> Vec<OutboundMessage> {
        let Some(queue) = self.queues.lock().await.get(user_id).cloned() else {
            return Vec::new();
        };
        let buffer = queue.buffer.lock().await;
        buffer.iter().cloned().collect()
    }

    async fn queue(&self, user_id: &UserId) -> Arc<UserQueue> {
        let limit = self.buffer_limit;
        Arc::clone(
            self.queues
                .lock()
                .await
                .entry(user_id.clone())
                .or_insert_with(|| Arc::new(UserQueue::new(limit))),
        )
    }

    async fn release_if_idle(&self, user_id: &UserId) {
        let mut queues = self.queues.lock().await;
        // Queues are only handed out under this lock, so a count of one means
        // no task holds this queue.
        let idle = queues.get(user_id).is_some_and(|queue| {
            Arc::strong_count(queue) == 1
                && queue
                    .buffer
                    .try_lock()
                    .is_ok_and(|buffer| buffer.is_empty())
        });
        if idle {
            queues.remove(user_id);
        }
    }

    async fn record_history(&self, user_id: &UserId, message: &OutboundMessage) {
        let entry = HistoryEntry::outbound(user_id.clone(), message, self.clock.as_ref());
        if let Err(err) = self.history.append(&entry).await {
            tracing::warn!(
                user_id = %user_id,
                correlation_id = %message.envelope().correlation_id(),
                error = %err,
                "failed to record outbound history"
            );
        }
    }
}

impl<C: Clock + Send + Sync> std::fmt::Debug for DeliveryBridge<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryBridge")
            .field("buffer_limit", &self.buffer_limit)
            .finish_non_exhaustive()
    }
}

/// Sends a message to every connection, reporting the first failure.
///
/// Every connection is attempted, including those after a failing one.
async fn send_to_all(
    connections: &[Arc<dyn LiveConnection>],
    message: &OutboundMessage,
) -> Result<(), DeliveryError> {
    let mut first_failure = None;
    for connection in connections {
        if let Err(err) = connection.send(message).await {
            tracing::debug!(connection_id = %connection.id(), error = %err, "send failed");
            first_failure.get_or_insert(err);
        }
    }
    first_failure.map_or(Ok(()), Err)
}

fn log_evicted(user_id: &UserId, evicted: &[OutboundMessage]) {
    for message in evicted {
        tracing::warn!(
            user_id = %user_id,
            correlation_id = %message.envelope().correlation_id(),
            "delivery buffer full; dropped oldest message"
        );
    }
}
