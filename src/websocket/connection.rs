use std::borrow::Cow;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::frame::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::error::WebSocketError;

/// Handle to one accepted client connection.
///
/// Writes go through an unbounded channel drained by the connection's
/// forwarding task, so concurrent senders never interleave partial frames
/// on the underlying transport.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    id: Uuid,
    sender: mpsc::UnboundedSender<Message>,
}

impl ClientConnection {
    pub fn new(id: Uuid, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a text frame for delivery to this client.
    pub fn send_text(&self, text: &str) -> Result<(), WebSocketError> {
        self.sender
            .send(Message::Text(text.to_string()))
            .map_err(|e| WebSocketError::SendError(e.to_string()))
    }

    /// Queue a raw protocol frame (pong replies, etc.).
    pub fn send_frame(&self, message: Message) -> Result<(), WebSocketError> {
        self.sender
            .send(message)
            .map_err(|e| WebSocketError::SendError(e.to_string()))
    }

    /// Queue a close frame with the given reason. The forwarding task stops
    /// after transmitting it.
    pub fn close(&self, reason: &str) -> Result<(), WebSocketError> {
        self.sender
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Normal,
                reason: Cow::Owned(reason.to_string()),
            })))
            .map_err(|e| WebSocketError::SendError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_send_text_queues_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection = ClientConnection::new(Uuid::new_v4(), tx);

        assert_ok!(connection.send_text("hello"));

        match rx.try_recv() {
            Ok(Message::Text(text)) => assert_eq!(text, "hello"),
            other => panic!("Expected text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_queues_close_frame_with_reason() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection = ClientConnection::new(Uuid::new_v4(), tx);

        assert_ok!(connection.close("shutdown"));

        match rx.try_recv() {
            Ok(Message::Close(Some(frame))) => assert_eq!(frame.reason, "shutdown"),
            other => panic!("Expected close frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_fails() {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = ClientConnection::new(Uuid::new_v4(), tx);
        drop(rx);

        let result = connection.send_text("hello");
        assert!(matches!(result, Err(WebSocketError::SendError(_))));
    }
}
