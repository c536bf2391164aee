use serde::{Deserialize, Serialize};
use serde_json::json;

// Inbound game server event flags
pub const FLAG_SERVER_STARTING: u32 = 1001;
pub const FLAG_SERVER_STARTED: u32 = 1002;
pub const FLAG_SERVER_STOPPING: u32 = 1003;
pub const FLAG_SERVER_STOPPED: u32 = 1004;
pub const FLAG_PLAYER_JOINED: u32 = 1011;
pub const FLAG_PLAYER_LEFT: u32 = 1012;
pub const FLAG_PLAYER_CHAT: u32 = 1013;
pub const FLAG_PLAYER_DIED: u32 = 1014;
pub const FLAG_PLAYER_ADVANCEMENT: u32 = 1015;

// Outbound group chat flag
pub const FLAG_GROUP_CHAT: u32 = 2003;

/// Inbound game server event frame: a numeric flag plus a parameter bag.
#[derive(Debug, Clone, Deserialize)]
pub struct GameEvent {
    pub message_flag: u32,
    #[serde(default)]
    pub params: EventParams,
}

/// Parameters attached to an event. Fields a given event does not use are
/// simply absent and render as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventParams {
    pub server_name: Option<String>,
    pub player_name: Option<String>,
    pub chat_message: Option<String>,
    pub dead_reason: Option<String>,
    pub advancement: Option<String>,
}

/// Relay category an event flag belongs to, used for config toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Lifecycle,
    Presence,
    Chat,
    Death,
    Advancement,
}

impl EventCategory {
    pub fn of(flag: u32) -> Option<Self> {
        match flag {
            FLAG_SERVER_STARTING..=FLAG_SERVER_STOPPED => Some(Self::Lifecycle),
            FLAG_PLAYER_JOINED | FLAG_PLAYER_LEFT => Some(Self::Presence),
            FLAG_PLAYER_CHAT => Some(Self::Chat),
            FLAG_PLAYER_DIED => Some(Self::Death),
            FLAG_PLAYER_ADVANCEMENT => Some(Self::Advancement),
            _ => None,
        }
    }
}

/// Render an event as a group chat line. Returns None for flags that are not
/// relayed.
pub fn format_event(event: &GameEvent) -> Option<String> {
    let params = &event.params;
    let server = params.server_name.as_deref().unwrap_or("");
    let player = params.player_name.as_deref().unwrap_or("");

    let text = match event.message_flag {
        FLAG_SERVER_STARTING => format!("[{}] server is starting", server),
        FLAG_SERVER_STARTED => format!("[{}] server startup complete", server),
        FLAG_SERVER_STOPPING => format!("[{}] server is shutting down", server),
        FLAG_SERVER_STOPPED => format!("[{}] server has stopped", server),
        FLAG_PLAYER_JOINED => format!("[{}] {} joined the server", server, player),
        FLAG_PLAYER_LEFT => format!("[{}] {} left the server", server, player),
        FLAG_PLAYER_CHAT => format!(
            "[{}]\n{}: {}",
            server,
            player,
            params.chat_message.as_deref().unwrap_or("")
        ),
        FLAG_PLAYER_DIED => format!(
            "[{}]\n{} died ({})",
            server,
            player,
            params.dead_reason.as_deref().unwrap_or("")
        ),
        FLAG_PLAYER_ADVANCEMENT => format!(
            "[{}]\n{} earned the advancement: {}",
            server,
            player,
            params.advancement.as_deref().unwrap_or("")
        ),
        _ => return None,
    };

    Some(text)
}

/// One group chat message headed for the game servers.
#[derive(Debug, Clone, Serialize)]
pub struct GroupChatMessage {
    pub group_id: String,
    pub group_name: String,
    pub member_id: String,
    pub member_name: String,
    pub chat_message: String,
}

impl GroupChatMessage {
    /// In-game chat line with Minecraft formatting codes.
    pub fn raw_message(&self) -> String {
        format!(
            "\u{a7}b[Group]\u{a7}e ({}) \u{a7}a<{}> \u{a7}r{}",
            self.group_name, self.member_name, self.chat_message
        )
    }

    /// Wire frame broadcast to connected game servers.
    pub fn to_frame(&self) -> crate::Result<String> {
        let frame = json!({
            "message_flag": FLAG_GROUP_CHAT,
            "params": {
                "group_id": self.group_id,
                "group_name": self.group_name,
                "member_id": self.member_id,
                "member_name": self.member_name,
                "chat_message": self.chat_message,
                "raw_message": self.raw_message(),
            }
        });
        Ok(serde_json::to_string(&frame)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_lifecycle_event() {
        let payload = r#"{"message_flag":1001,"params":{"server_name":"Lobby"}}"#;
        let event: GameEvent = serde_json::from_str(payload).expect("payload should parse");

        assert_eq!(event.message_flag, FLAG_SERVER_STARTING);
        assert_eq!(
            format_event(&event).as_deref(),
            Some("[Lobby] server is starting")
        );
    }

    #[test]
    fn test_format_chat_event() {
        let payload = r#"{
            "message_flag": 1013,
            "params": {"server_name": "Survival", "player_name": "Steve", "chat_message": "hi all"}
        }"#;
        let event: GameEvent = serde_json::from_str(payload).expect("payload should parse");

        assert_eq!(
            format_event(&event).as_deref(),
            Some("[Survival]\nSteve: hi all")
        );
    }

    #[test]
    fn test_missing_params_render_empty() {
        let payload = r#"{"message_flag":1014,"params":{"server_name":"Survival"}}"#;
        let event: GameEvent = serde_json::from_str(payload).expect("payload should parse");

        assert_eq!(format_event(&event).as_deref(), Some("[Survival]\n died ()"));
    }

    #[test]
    fn test_unrecognized_flag_is_not_formatted() {
        let payload = r#"{"message_flag":9999}"#;
        let event: GameEvent = serde_json::from_str(payload).expect("payload should parse");

        assert!(EventCategory::of(event.message_flag).is_none());
        assert!(format_event(&event).is_none());
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(EventCategory::of(1002), Some(EventCategory::Lifecycle));
        assert_eq!(EventCategory::of(1011), Some(EventCategory::Presence));
        assert_eq!(EventCategory::of(1013), Some(EventCategory::Chat));
        assert_eq!(EventCategory::of(1014), Some(EventCategory::Death));
        assert_eq!(EventCategory::of(1015), Some(EventCategory::Advancement));
        assert_eq!(EventCategory::of(2003), None);
    }

    #[test]
    fn test_group_chat_frame() {
        let message = GroupChatMessage {
            group_id: "100001".to_string(),
            group_name: "MC Friends".to_string(),
            member_id: "42".to_string(),
            member_name: "alice".to_string(),
            chat_message: "anyone online?".to_string(),
        };

        let frame = message.to_frame().expect("frame should encode");
        let value: serde_json::Value = serde_json::from_str(&frame).expect("frame should parse");

        assert_eq!(value["message_flag"], 2003);
        assert_eq!(value["params"]["group_id"], "100001");
        assert_eq!(value["params"]["member_name"], "alice");
        assert_eq!(
            value["params"]["raw_message"],
            "\u{a7}b[Group]\u{a7}e (MC Friends) \u{a7}a<alice> \u{a7}ranyone online?"
        );
    }
}
