use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

pub mod events;
pub mod message_types;

/// Unique identifier for one WebSocket connection.
///
/// A user reconnecting gets a fresh id, which lets teardown of a superseded
/// connection distinguish itself from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

struct Connection {
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

/// Presence table: user id to live connection handle.
///
/// The one piece of shared mutable state outside the database. Created at
/// process start and injected through `AppState`, never a global, so tests
/// can drive it with fake connections. Entries are transient; nothing here
/// survives a restart, and the message store remains the source of truth.
#[derive(Default, Clone)]
pub struct PresenceRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Connection>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user's connection. Last connection wins: any prior handle
    /// for the same user is dropped, which ends its delivery stream.
    ///
    /// Returns the connection id (needed for disconnect) and the receiving
    /// end the session forwards to its socket.
    pub async fn connect(&self, user_id: Uuid) -> (ConnectionId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let connection_id = ConnectionId::new();

        let mut guard = self.inner.write().await;
        let previous = guard.insert(
            user_id,
            Connection {
                id: connection_id,
                sender: tx,
            },
        );

        if previous.is_some() {
            tracing::debug!(%user_id, "presence: superseded an existing connection");
        }
        tracing::debug!(%user_id, ?connection_id, "presence: connected");

        (connection_id, rx)
    }

    /// Remove a user's connection on disconnect or logout.
    ///
    /// Only removes the entry if `connection_id` still owns it; tearing down
    /// a superseded connection must not evict its replacement. Returns
    /// whether the user actually went offline.
    pub async fn disconnect(&self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        let mut guard = self.inner.write().await;

        let owns_entry = guard.get(&user_id).map(|c| c.id) == Some(connection_id);
        if owns_entry {
            guard.remove(&user_id);
            tracing::debug!(%user_id, ?connection_id, "presence: disconnected");
        }
        owns_entry
    }

    /// Forward a payload to the user's live connection, if any.
    ///
    /// Absence of a connection is a normal condition, not an error: the
    /// message is already durable and the recipient will fetch it on next
    /// connect. A dead handle is cleaned up on the way out. Returns whether
    /// the payload was handed to a connection.
    pub async fn push(&self, user_id: Uuid, payload: String) -> bool {
        let mut guard = self.inner.write().await;

        let delivered = match guard.get(&user_id) {
            Some(connection) => connection.sender.send(payload).is_ok(),
            None => return false,
        };

        if !delivered {
            // Receiver gone without a disconnect; drop the entry
            guard.remove(&user_id);
            tracing::debug!(%user_id, "presence: removed dead connection on push");
        }
        delivered
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.inner.read().await.contains_key(&user_id)
    }

    pub async fn online_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_to_connected_user_delivers() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();

        let (_conn, mut rx) = registry.connect(user).await;

        assert!(registry.push(user, "hello".to_string()).await);
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_push_to_disconnected_user_is_noop() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();

        // never errors, never panics
        assert!(!registry.push(user, "hello".to_string()).await);
        assert_eq!(registry.online_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_removes_presence() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();

        let (conn, _rx) = registry.connect(user).await;
        assert!(registry.is_online(user).await);

        assert!(registry.disconnect(user, conn).await);
        assert!(!registry.is_online(user).await);
        assert!(!registry.push(user, "late".to_string()).await);
    }

    #[tokio::test]
    async fn test_reconnect_last_connection_wins() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();

        let (old_conn, mut old_rx) = registry.connect(user).await;
        let (_new_conn, mut new_rx) = registry.connect(user).await;

        // the old handle is gone; its stream ends
        assert!(old_rx.recv().await.is_none());

        // pushes land on the most recent connection
        assert!(registry.push(user, "fresh".to_string()).await);
        assert_eq!(new_rx.recv().await.unwrap(), "fresh");

        // stale teardown of the superseded connection must not evict the new one
        assert!(!registry.disconnect(user, old_conn).await);
        assert!(registry.is_online(user).await);
    }

    #[tokio::test]
    async fn test_push_cleans_up_dead_connection() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();

        let (_conn, rx) = registry.connect(user).await;
        drop(rx);

        assert!(!registry.push(user, "into the void".to_string()).await);
        assert!(!registry.is_online(user).await);
    }
}
