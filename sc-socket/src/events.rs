//! Socket event types.
//!
//! Defines the event types streamed from the chat server, the generic
//! `ChatEvent` envelope handed to listeners, and the `ConnectedEvent` that
//! acknowledges a completed handshake.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sc_core::constants::event_types;

use crate::conf::User;

/// Event types emitted by the chat server.
///
/// Only the types the socket layer reasons about, plus the most common
/// application events, get their own variant. Anything else is carried
/// through as `Unknown` so listeners still receive it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// Server keep-alive (`health.check`). The first one on a connection carries `me`.
    HealthCheck,
    /// Handshake acknowledgement (`connection.ok`).
    ConnectionOk,
    /// A new message in a watched channel (`message.new`).
    MessageNew,
    /// A message was edited (`message.updated`).
    MessageUpdated,
    /// A message was deleted (`message.deleted`).
    MessageDeleted,
    /// A channel was marked read (`message.read`).
    MessageRead,
    /// A reaction was added (`reaction.new`).
    ReactionNew,
    /// A reaction was removed (`reaction.deleted`).
    ReactionDeleted,
    /// A member started typing (`typing.start`).
    TypingStart,
    /// A member stopped typing (`typing.stop`).
    TypingStop,
    /// Channel data changed (`channel.updated`).
    ChannelUpdated,
    /// A channel was deleted (`channel.deleted`).
    ChannelDeleted,
    /// A user went online or offline (`user.presence.changed`).
    UserPresenceChanged,
    /// User data changed (`user.updated`).
    UserUpdated,
    /// A new message in an unwatched channel (`notification.message_new`).
    NotificationMessageNew,
    /// Unknown/unhandled event type.
    Unknown(String),
}

impl EventType {
    /// Parse an event type string from the server.
    pub fn from_str(s: &str) -> Self {
        match s {
            event_types::HEALTH_CHECK => Self::HealthCheck,
            event_types::CONNECTION_OK => Self::ConnectionOk,
            event_types::MESSAGE_NEW => Self::MessageNew,
            event_types::MESSAGE_UPDATED => Self::MessageUpdated,
            event_types::MESSAGE_DELETED => Self::MessageDeleted,
            event_types::MESSAGE_READ => Self::MessageRead,
            event_types::REACTION_NEW => Self::ReactionNew,
            event_types::REACTION_DELETED => Self::ReactionDeleted,
            event_types::TYPING_START => Self::TypingStart,
            event_types::TYPING_STOP => Self::TypingStop,
            event_types::CHANNEL_UPDATED => Self::ChannelUpdated,
            event_types::CHANNEL_DELETED => Self::ChannelDeleted,
            event_types::USER_PRESENCE_CHANGED => Self::UserPresenceChanged,
            event_types::USER_UPDATED => Self::UserUpdated,
            event_types::NOTIFICATION_MESSAGE_NEW => Self::NotificationMessageNew,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Convert to the server event string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::HealthCheck => event_types::HEALTH_CHECK,
            Self::ConnectionOk => event_types::CONNECTION_OK,
            Self::MessageNew => event_types::MESSAGE_NEW,
            Self::MessageUpdated => event_types::MESSAGE_UPDATED,
            Self::MessageDeleted => event_types::MESSAGE_DELETED,
            Self::MessageRead => event_types::MESSAGE_READ,
            Self::ReactionNew => event_types::REACTION_NEW,
            Self::ReactionDeleted => event_types::REACTION_DELETED,
            Self::TypingStart => event_types::TYPING_START,
            Self::TypingStop => event_types::TYPING_STOP,
            Self::ChannelUpdated => event_types::CHANNEL_UPDATED,
            Self::ChannelDeleted => event_types::CHANNEL_DELETED,
            Self::UserPresenceChanged => event_types::USER_PRESENCE_CHANGED,
            Self::UserUpdated => event_types::USER_UPDATED,
            Self::NotificationMessageNew => event_types::NOTIFICATION_MESSAGE_NEW,
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Whether this event can acknowledge a handshake.
    pub fn is_connection_event(&self) -> bool {
        matches!(self, Self::ConnectionOk | Self::HealthCheck)
    }

    /// Whether this event type relates to messages.
    pub fn is_message_event(&self) -> bool {
        matches!(
            self,
            Self::MessageNew | Self::MessageUpdated | Self::MessageDeleted | Self::NotificationMessageNew
        )
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A socket event with its type and remaining payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// The type of event.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Server timestamp, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Connection the event was sent on, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    /// The rest of the event payload.
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ChatEvent {
    /// Create an event with an empty payload.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            created_at: None,
            connection_id: None,
            data: serde_json::Map::new(),
        }
    }

    /// Look up a top-level payload field.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}

/// Handshake acknowledgement carrying the server-assigned connection id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub connection_id: String,
    /// The connected user; absent for some anonymous connections.
    #[serde(default)]
    pub me: Option<User>,
}

impl ConnectedEvent {
    /// Create an acknowledgement for the given connection id.
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            event_type: EventType::ConnectionOk,
            created_at: None,
            connection_id: connection_id.into(),
            me: None,
        }
    }

    /// The keep-alive check sent by the health monitor on this connection.
    pub fn keep_alive_event(&self) -> ChatEvent {
        ChatEvent {
            event_type: EventType::HealthCheck,
            created_at: Some(Utc::now()),
            connection_id: Some(self.connection_id.clone()),
            data: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(EventType::from_str("health.check"), EventType::HealthCheck);
        assert_eq!(EventType::from_str("connection.ok"), EventType::ConnectionOk);
        assert_eq!(EventType::from_str("message.new"), EventType::MessageNew);
        assert_eq!(
            EventType::from_str("notification.message_new"),
            EventType::NotificationMessageNew
        );
        assert_eq!(
            EventType::from_str("poll.closed"),
            EventType::Unknown("poll.closed".into())
        );
    }

    #[test]
    fn test_event_type_categories() {
        assert!(EventType::ConnectionOk.is_connection_event());
        assert!(EventType::HealthCheck.is_connection_event());
        assert!(!EventType::MessageNew.is_connection_event());
        assert!(EventType::MessageDeleted.is_message_event());
        assert!(!EventType::TypingStart.is_message_event());
    }

    #[test]
    fn test_chat_event_deserialize_keeps_payload() {
        let event: ChatEvent = serde_json::from_value(serde_json::json!({
            "type": "message.new",
            "created_at": "2022-03-01T10:00:00Z",
            "cid": "messaging:general",
            "message": {"id": "m1", "text": "hi"}
        }))
        .unwrap();
        assert_eq!(event.event_type, EventType::MessageNew);
        assert!(event.created_at.is_some());
        assert_eq!(event.get("cid").and_then(|v| v.as_str()), Some("messaging:general"));
        assert!(event.get("type").is_none());
    }

    #[test]
    fn test_unknown_event_serializes_original_name() {
        let event = ChatEvent::new(EventType::from_str("custom.thing"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "custom.thing");
    }

    #[test]
    fn test_connected_event_deserialize() {
        let event: ConnectedEvent = serde_json::from_value(serde_json::json!({
            "type": "health.check",
            "connection_id": "abc-123",
            "me": {"id": "jc", "name": "Jc"}
        }))
        .unwrap();
        assert_eq!(event.connection_id, "abc-123");
        assert_eq!(event.me.unwrap().id, "jc");
    }

    #[test]
    fn test_keep_alive_event() {
        let event = ConnectedEvent::new("conn-1").keep_alive_event();
        assert_eq!(event.event_type, EventType::HealthCheck);
        assert_eq!(event.connection_id.as_deref(), Some("conn-1"));
    }
}
