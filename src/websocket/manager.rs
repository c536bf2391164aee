use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::WebSocketError;
use crate::websocket::{MessageHandler, WebSocketServer};

/// Background accept loop for one endpoint, stoppable via the shutdown signal.
struct ListenerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owns the listening transport and at most one [`WebSocketServer`] per
/// endpoint key. Keys are the canonical `ws://{host}:{port}{path}` URI of the
/// bound endpoint.
pub struct WebSocketManager {
    host: String,
    port: u16,
    path: String,
    servers: RwLock<HashMap<String, Arc<WebSocketServer>>>,
    listeners: Mutex<HashMap<String, ListenerHandle>>,
}

fn endpoint_key(host: &str, port: u16, path: &str) -> crate::Result<String> {
    let url = Url::parse(&format!("ws://{}:{}{}", host, port, path))?;
    Ok(url.to_string())
}

impl WebSocketManager {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            path: config.path.clone(),
            servers: RwLock::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Bind the configured endpoint and start accepting connections.
    ///
    /// Starting an endpoint that is already running is a no-op returning the
    /// existing key; a second listener is never created. The returned key
    /// reflects the port actually bound, so configuring port 0 yields a
    /// usable ephemeral endpoint.
    pub async fn start(&self, handler: Arc<dyn MessageHandler>) -> crate::Result<String> {
        let mut servers = self.servers.write().await;

        if let Some(key) = servers.keys().next().cloned() {
            warn!("WebSocket server already running at {}", key);
            return Ok(key);
        }

        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        let local_addr = listener.local_addr()?;
        let key = endpoint_key(&self.host, local_addr.port(), &self.path)?;

        let server = Arc::new(WebSocketServer::new(self.path.clone(), handler));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let accept_server = server.clone();
        let endpoint = key.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Listener for {} shutting down", endpoint);
                        break;
                    }
                    accepted = listener.accept() => match accepted {
                        Ok((stream, addr)) => {
                            let server = accept_server.clone();
                            tokio::spawn(async move {
                                server.handle_connection(stream, addr).await;
                            });
                        }
                        Err(e) => {
                            error!("Error accepting connection on {}: {}", endpoint, e);
                        }
                    }
                }
            }
        });

        servers.insert(key.clone(), server);
        self.listeners.lock().await.insert(
            key.clone(),
            ListenerHandle {
                shutdown: shutdown_tx,
                task,
            },
        );

        info!("WebSocket server started at {}", key);
        Ok(key)
    }

    /// Disconnect all clients with the given reason and tear the endpoint
    /// down. The accept loop has fully terminated by the time this returns.
    /// Stopping an endpoint that is not running is an error.
    pub async fn stop(&self, endpoint_key: &str, reason: &str) -> crate::Result<()> {
        let server = match self.servers.write().await.remove(endpoint_key) {
            Some(server) => server,
            None => {
                error!("WebSocket server {} not found", endpoint_key);
                return Err(WebSocketError::ServerNotFound(endpoint_key.to_string()).into());
            }
        };

        // Stop accepting before tearing down clients so none slip in between
        if let Some(handle) = self.listeners.lock().await.remove(endpoint_key) {
            let _ = handle.shutdown.send(());
            if let Err(e) = handle.task.await {
                error!("Listener task for {} failed: {}", endpoint_key, e);
            }
        }

        server.stop_all(reason).await;
        info!("WebSocket server {} stopped: {}", endpoint_key, reason);
        Ok(())
    }

    /// Route a unicast to the named endpoint's server. Returns false when the
    /// endpoint or the client is unknown.
    pub async fn send_to_client(&self, endpoint_key: &str, client_id: Uuid, text: &str) -> bool {
        match self.server(endpoint_key).await {
            Some(server) => server.send_message(client_id, text).await,
            None => {
                error!(
                    "Unicast failed, no server registered for endpoint: {}",
                    endpoint_key
                );
                false
            }
        }
    }

    /// Route a broadcast to the named endpoint's server. Returns false when
    /// the endpoint is unknown.
    pub async fn broadcast(&self, endpoint_key: &str, text: &str) -> bool {
        match self.server(endpoint_key).await {
            Some(server) => {
                server.broadcast(text).await;
                true
            }
            None => {
                error!(
                    "Broadcast failed, no server registered for endpoint: {}",
                    endpoint_key
                );
                false
            }
        }
    }

    pub async fn active_endpoints(&self) -> Vec<String> {
        self.servers.read().await.keys().cloned().collect()
    }

    pub async fn connection_count(&self, endpoint_key: &str) -> Option<usize> {
        match self.server(endpoint_key).await {
            Some(server) => Some(server.connection_count().await),
            None => None,
        }
    }

    async fn server(&self, endpoint_key: &str) -> Option<Arc<WebSocketServer>> {
        self.servers.read().await.get(endpoint_key).cloned()
    }
}
