use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::websocket::ClientConnection;

/// Map of live client connections, scoped to one server.
///
/// An entry present here denotes a connection believed open. Reads used for
/// broadcast take a snapshot so iteration never observes concurrent
/// insertions or removals.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<Uuid, ClientConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, connection: ClientConnection) {
        let id = connection.id();
        self.connections.write().await.insert(id, connection);
        info!("Registered connection {}", id);
    }

    /// Remove a connection. Removing an id that is no longer present is a
    /// no-op, so the explicit-disconnect and peer-close paths can race freely.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            info!("Removed connection {}", id);
        }
        removed
    }

    pub async fn get(&self, id: &Uuid) -> Option<ClientConnection> {
        self.connections.read().await.get(id).cloned()
    }

    /// Snapshot of every registered connection at the time of the call.
    pub async fn all(&self) -> Vec<ClientConnection> {
        self.connections.read().await.values().cloned().collect()
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.connections.read().await.keys().copied().collect()
    }

    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message;

    fn test_connection() -> (ClientConnection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientConnection::new(Uuid::new_v4(), tx), rx)
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = ConnectionRegistry::new();
        let (conn1, _rx1) = test_connection();
        let (conn2, _rx2) = test_connection();
        let id1 = conn1.id();

        registry.register(conn1).await;
        registry.register(conn2).await;
        assert_eq!(registry.count().await, 2);

        let found = registry.get(&id1).await.expect("connection should exist");
        assert_eq!(found.id(), id1);
        assert!(registry.get(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = test_connection();
        let id = conn.id();

        registry.register(conn).await;
        assert!(registry.remove(&id).await);
        // Second removal of the same id is a no-op, not an error
        assert!(!registry.remove(&id).await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_all_returns_snapshot() {
        let registry = ConnectionRegistry::new();
        let (conn1, _rx1) = test_connection();
        let (conn2, _rx2) = test_connection();
        let id1 = conn1.id();

        registry.register(conn1).await;
        registry.register(conn2).await;

        let snapshot = registry.all().await;
        assert_eq!(snapshot.len(), 2);

        // Removing after the snapshot was taken does not affect it
        registry.remove(&id1).await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.count().await, 1);
    }
}
