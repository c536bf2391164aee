//! Bridge glue between the WebSocket core and the group chat platform
//!
//! This module consumes inbound game events through the core's message
//! handler seam and pushes outbound group chat back through the manager.
//! The actual chat platform client lives behind the [`ChatSink`] trait.

mod events;

pub use events::{
    format_event, EventCategory, EventParams, GameEvent, GroupChatMessage, FLAG_GROUP_CHAT,
    FLAG_PLAYER_ADVANCEMENT, FLAG_PLAYER_CHAT, FLAG_PLAYER_DIED, FLAG_PLAYER_JOINED,
    FLAG_PLAYER_LEFT, FLAG_SERVER_STARTED, FLAG_SERVER_STARTING, FLAG_SERVER_STOPPED,
    FLAG_SERVER_STOPPING,
};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{BridgeConfig, RelayConfig};
use crate::websocket::{ClientConnection, MessageHandler, WebSocketManager};

/// Outbound text delivery to one chat group. Implemented by the platform
/// client; failures are its own concern and opaque to the core.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn deliver(&self, target: &str, text: &str) -> crate::Result<()>;
}

impl RelayConfig {
    pub fn allows(&self, category: EventCategory) -> bool {
        match category {
            EventCategory::Lifecycle => self.lifecycle,
            EventCategory::Presence => self.presence,
            EventCategory::Chat => self.chat,
            EventCategory::Death => self.deaths,
            EventCategory::Advancement => self.advancements,
        }
    }
}

/// Parses inbound game event frames and relays them to every configured
/// group through the sink.
pub struct BridgeHandler {
    config: BridgeConfig,
    sink: Arc<dyn ChatSink>,
}

impl BridgeHandler {
    pub fn new(config: BridgeConfig, sink: Arc<dyn ChatSink>) -> Self {
        Self { config, sink }
    }
}

#[async_trait]
impl MessageHandler for BridgeHandler {
    async fn handle(
        &self,
        _connection: &ClientConnection,
        client_id: Uuid,
        payload: &str,
    ) -> crate::Result<()> {
        // A malformed frame propagates up; the server reports it back to the
        // sending client and keeps the connection alive
        let event: GameEvent = serde_json::from_str(payload)?;
        debug!(
            "Received game event from {}: flag {}",
            client_id, event.message_flag
        );

        let category = match EventCategory::of(event.message_flag) {
            Some(category) => category,
            None => return Ok(()),
        };
        if !self.config.relay.allows(category) {
            return Ok(());
        }
        let text = match format_event(&event) {
            Some(text) => text,
            None => return Ok(()),
        };

        for group_id in &self.config.group_ids {
            if let Err(e) = self.sink.deliver(group_id, &text).await {
                error!("Failed to deliver event to group {}: {}", group_id, e);
            }
        }

        Ok(())
    }
}

/// Forward one group chat message to every active endpoint. Messages from
/// groups outside the configured list are dropped.
pub async fn forward_group_message(
    manager: &WebSocketManager,
    config: &BridgeConfig,
    message: &GroupChatMessage,
) -> crate::Result<()> {
    if !config.group_ids.contains(&message.group_id) {
        debug!("Ignoring message from unbridged group {}", message.group_id);
        return Ok(());
    }

    let frame = message.to_frame()?;
    for endpoint in manager.active_endpoints().await {
        manager.broadcast(&endpoint, &frame).await;
    }

    Ok(())
}

/// Stand-in sink that logs deliveries until a platform client is wired in.
pub struct LoggingChatSink;

#[async_trait]
impl ChatSink for LoggingChatSink {
    async fn deliver(&self, target: &str, text: &str) -> crate::Result<()> {
        info!("[group {}] {}", target, text);
        Ok(())
    }
}
