//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "StreamChat";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Client identifier sent with the connect payload.
pub const CLIENT_IDENTIFIER: &str = concat!("stream-chat-rust-client-", env!("CARGO_PKG_VERSION"));

/// Maximum number of scheduled retries after a transient protocol error.
pub const RETRY_LIMIT: u32 = 3;

/// Base delay for transient-error retries, in milliseconds.
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Health monitor wake-up interval, in milliseconds.
pub const HEALTH_MONITOR_INTERVAL_MS: u64 = 1_000;

/// Interval between keep-alive checks, in milliseconds.
pub const HEALTH_CHECK_INTERVAL_MS: u64 = 10_000;

/// Silence after which a connection is considered dead, in milliseconds.
pub const NO_EVENT_INTERVAL_THRESHOLD_MS: u64 = 30_000;

/// Upper bound for the health monitor's reconnect interval, in milliseconds.
pub const MAX_RECONNECT_INTERVAL_MS: u64 = 25_000;

/// WebSocket close code used when the client closes the connection.
pub const CODE_CLOSE_SOCKET_FROM_CLIENT: u16 = 1000;

/// Capacity of the outbound frame queue of a transport.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Server event type names.
pub mod event_types {
    pub const HEALTH_CHECK: &str = "health.check";
    pub const CONNECTION_OK: &str = "connection.ok";
    pub const MESSAGE_NEW: &str = "message.new";
    pub const MESSAGE_UPDATED: &str = "message.updated";
    pub const MESSAGE_DELETED: &str = "message.deleted";
    pub const MESSAGE_READ: &str = "message.read";
    pub const REACTION_NEW: &str = "reaction.new";
    pub const REACTION_DELETED: &str = "reaction.deleted";
    pub const TYPING_START: &str = "typing.start";
    pub const TYPING_STOP: &str = "typing.stop";
    pub const CHANNEL_UPDATED: &str = "channel.updated";
    pub const CHANNEL_DELETED: &str = "channel.deleted";
    pub const USER_PRESENCE_CHANGED: &str = "user.presence.changed";
    pub const USER_UPDATED: &str = "user.updated";
    pub const NOTIFICATION_MESSAGE_NEW: &str = "notification.message_new";
}
