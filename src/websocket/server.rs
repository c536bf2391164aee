use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::websocket::{ClientConnection, ConnectionRegistry};

/// Inbound message callback supplied by the bridge layer.
///
/// Invoked from the owning connection's receive loop, one frame at a time per
/// client. An error return is caught by the loop, logged, and reported back to
/// the originating client; it never terminates the connection.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(
        &self,
        connection: &ClientConnection,
        client_id: Uuid,
        payload: &str,
    ) -> crate::Result<()>;
}

pub struct WebSocketServer {
    path: String,
    registry: ConnectionRegistry,
    handler: Arc<dyn MessageHandler>,
}

impl WebSocketServer {
    pub fn new(path: String, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            path,
            registry: ConnectionRegistry::new(),
            handler,
        }
    }

    /// Accept the upgrade, register the client, and drive its receive loop
    /// until the peer disconnects or the transport faults. Registry cleanup
    /// runs on every exit path; the explicit-disconnect path may have removed
    /// the entry already, in which case removal here is a no-op.
    pub async fn handle_connection(self: Arc<Self>, raw_stream: TcpStream, addr: SocketAddr) {
        info!("New WebSocket connection from: {}", addr);

        let expected_path = self.path.clone();
        let callback = move |request: &Request, response: Response| {
            if request.uri().path() == expected_path {
                Ok(response)
            } else {
                warn!(
                    "Rejected upgrade request for unknown path: {}",
                    request.uri().path()
                );
                let mut not_found =
                    ErrorResponse::new(Some("no websocket endpoint at this path".to_string()));
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Err(not_found)
            }
        };

        let ws_stream = match tokio_tungstenite::accept_hdr_async(raw_stream, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("Error during WebSocket handshake: {}", e);
                return;
            }
        };

        let (ws_sink, ws_stream) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        let client_id = Uuid::new_v4();
        let connection = ClientConnection::new(client_id, tx);
        self.registry.register(connection.clone()).await;
        info!("Client {} connected from {}", client_id, addr);

        // Forward queued frames to the socket; a close frame ends the task
        let send_task = tokio::spawn(async move {
            let mut ws_sink = ws_sink;
            let mut rx = rx;

            while let Some(message) = rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = ws_sink.send(message).await {
                    error!("Error sending WebSocket message: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }

            if let Err(e) = ws_sink.close().await {
                debug!("Error closing WebSocket sink: {}", e);
            }
        });

        let mut ws_stream = ws_stream;

        while let Some(frame) = ws_stream.next().await {
            match frame {
                Ok(Message::Text(payload)) => {
                    if let Err(e) = self.handler.handle(&connection, client_id, &payload).await {
                        error!("Error handling message from {}: {}", client_id, e);
                        let report = format!("error processing message: {}", e);
                        if connection.send_text(&report).is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(frame)) => {
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    info!("Client {} closed the connection: {}", client_id, reason);
                    break;
                }
                Ok(Message::Ping(data)) => {
                    let _ = connection.send_frame(Message::Pong(data));
                }
                Ok(Message::Pong(_)) => {}
                Ok(_) => {
                    warn!("Received unsupported frame type from {}", client_id);
                }
                Err(e) => {
                    error!("Error receiving WebSocket message from {}: {}", client_id, e);
                    break;
                }
            }
        }

        if self.registry.remove(&client_id).await {
            info!("Connection {} closed", client_id);
        }

        // Dropping the last sender lets the forwarding task drain and close
        drop(connection);
        let _ = send_task.await;
    }

    /// Best-effort unicast. Delivery failure is logged, never raised.
    pub async fn send_message(&self, client_id: Uuid, text: &str) -> bool {
        let connection = match self.registry.get(&client_id).await {
            Some(connection) => connection,
            None => {
                warn!("No connected client {} to send message to", client_id);
                return false;
            }
        };

        match connection.send_text(text) {
            Ok(()) => {
                debug!("Sent message to client {}: {}", client_id, text);
                true
            }
            Err(e) => {
                error!("Failed to send message to client {}: {}", client_id, e);
                false
            }
        }
    }

    /// Send to every connection registered at the time of the call. A failure
    /// on one connection does not abort delivery to the rest.
    pub async fn broadcast(&self, text: &str) -> usize {
        let connections = self.registry.all().await;
        let mut delivered = 0;

        for connection in connections {
            match connection.send_text(text) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    error!("Failed to broadcast to connection {}: {}", connection.id(), e);
                }
            }
        }

        delivered
    }

    /// Close one client connection with the given reason and drop it from the
    /// registry. Returns false if the client was not registered.
    pub async fn disconnect(&self, client_id: Uuid, reason: &str) -> bool {
        let connection = match self.registry.get(&client_id).await {
            Some(connection) => connection,
            None => return false,
        };

        if let Err(e) = connection.close(reason) {
            warn!("Error closing connection {}: {}", client_id, e);
        }

        let removed = self.registry.remove(&client_id).await;
        if removed {
            info!("Client {} disconnected: {}", client_id, reason);
        }
        removed
    }

    /// Disconnect every registered client. The registry is empty afterwards.
    pub async fn stop_all(&self, reason: &str) {
        for client_id in self.registry.ids().await {
            self.disconnect(client_id, reason).await;
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.count().await
    }
}
