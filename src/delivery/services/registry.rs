//! Registry of live connections per user.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::DeliveryHandle;
use crate::delivery::{domain::ConnectionId, ports::LiveConnection};
use crate::envelope::UserId;

/// Live connections grouped by user.
///
/// Owns its own synchronisation and is shared between the transport layer
/// (register, unregister) and the delivery bridge (list).
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, Vec<Arc<dyn LiveConnection>>>>,
    flush_requests: Option<DeliveryHandle>,
}

impl ConnectionRegistry {
    /// Creates a registry that does not request flushes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that asks the dispatcher behind `handle` to flush a
    /// user's buffer whenever a connection registers.
    #[must_use]
    pub fn with_flush_requests(handle: DeliveryHandle) -> Self {
        Self {
            connections: RwLock::default(),
            flush_requests: Some(handle),
        }
    }

    /// Adds a connection for `user_id` and requests a flush of anything
    /// buffered while the user was offline.
    pub async fn register(&self, user_id: &UserId, connection: Arc<dyn LiveConnection>) {
        let connection_id = connection.id();
        self.connections
            .write()
            .await
            .entry(user_id.clone())
            .or_default()
            .push(connection);
        tracing::info!(user_id = %user_id, connection_id = %connection_id, "connection registered");

        if let Some(handle) = &self.flush_requests
            && let Err(err) = handle.request_flush(user_id.clone()).await
        {
            tracing::warn!(user_id = %user_id, error = %err, "could not request buffer flush");
        }
    }

    /// Removes one connection, or every connection of the user when
    /// `connection_id` is `None`.
    ///
    /// Removing an unknown connection is a no-op. A user left without
    /// connections has no entry.
    pub async fn unregister(&self, user_id: &UserId, connection_id: Option<ConnectionId>) {
        let mut connections = self.connections.write().await;
        let Some(id) = connection_id else {
            connections.remove(user_id);
            tracing::info!(user_id = %user_id, "all connections unregistered");
            return;
        };
        let now_empty = connections.get_mut(user_id).is_some_and(|entries| {
            entries.retain(|connection| connection.id() != id);
            entries.is_empty()
        });
        if now_empty {
            connections.remove(user_id);
        }
        tracing::info!(user_id = %user_id, connection_id = %id, "connection unregistered");
    }

    /// Returns the live connections of a user, possibly none.
    pub async fn list(&self, user_id: &UserId) -> Vec<Arc<dyn LiveConnection>> {
        self.connections
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns whether the registry holds an entry for `user_id`.
    pub async fn contains(&self, user_id: &UserId) -> bool {
        self.connections.read().await.contains_key(user_id)
    }
}
