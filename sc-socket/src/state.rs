//! Connection state and disconnect causes.

use sc_core::ChatError;

use crate::events::ConnectedEvent;

/// Connection state of the socket.
///
/// Exactly one state is current at any time. Assigning a state equal to
/// the current one is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Transport handshake in progress.
    Connecting,
    /// Handshake completed.
    Connected(ConnectedEvent),
    /// The device has no network; distinct from application-level disconnects.
    NetworkDisconnected,
    /// Recoverable failure, eligible for reconnection.
    DisconnectedTemporarily(Option<ChatError>),
    /// Unrecoverable; only an explicit connect call leaves this state.
    DisconnectedPermanently(Option<ChatError>),
    /// Closed on caller request.
    DisconnectedByRequest,
}

impl ConnectionState {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected(_) => "connected",
            Self::NetworkDisconnected => "network_disconnected",
            Self::DisconnectedTemporarily(_) => "disconnected_temporarily",
            Self::DisconnectedPermanently(_) => "disconnected_permanently",
            Self::DisconnectedByRequest => "disconnected_by_request",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// The acknowledgement of the current connection, if connected.
    pub fn connected_event(&self) -> Option<&ConnectedEvent> {
        match self {
            Self::Connected(event) => Some(event),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the socket reported a disconnect.
#[derive(Debug, Clone, PartialEq)]
pub enum DisconnectCause {
    NetworkNotAvailable,
    ConnectionReleased,
    Error(Option<ChatError>),
    UnrecoverableError(Option<ChatError>),
}

impl std::fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkNotAvailable => write!(f, "network not available"),
            Self::ConnectionReleased => write!(f, "connection released"),
            Self::Error(Some(e)) => write!(f, "error: {e}"),
            Self::Error(None) => write!(f, "error"),
            Self::UnrecoverableError(Some(e)) => write!(f, "unrecoverable error: {e}"),
            Self::UnrecoverableError(None) => write!(f, "unrecoverable error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_core::ChatErrorCode;

    #[test]
    fn test_state_equality_is_by_value() {
        let a = ConnectionState::DisconnectedTemporarily(Some(ChatError::network(
            ChatErrorCode::SocketClosed,
        )));
        let b = ConnectionState::DisconnectedTemporarily(Some(ChatError::network(
            ChatErrorCode::SocketClosed,
        )));
        assert_eq!(a, b);
        assert_ne!(a, ConnectionState::DisconnectedTemporarily(None));
        assert_ne!(
            ConnectionState::Connected(ConnectedEvent::new("a")),
            ConnectionState::Connected(ConnectedEvent::new("b"))
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(
            ConnectionState::DisconnectedPermanently(None).to_string(),
            "disconnected_permanently"
        );
    }

    #[test]
    fn test_connected_event_accessor() {
        let state = ConnectionState::Connected(ConnectedEvent::new("conn-1"));
        assert!(state.is_connected());
        assert_eq!(state.connected_event().unwrap().connection_id, "conn-1");
        assert!(ConnectionState::NetworkDisconnected.connected_event().is_none());
    }

    #[test]
    fn test_disconnect_cause_display() {
        assert_eq!(
            DisconnectCause::NetworkNotAvailable.to_string(),
            "network not available"
        );
        let cause = DisconnectCause::UnrecoverableError(Some(ChatError::new("boom")));
        assert_eq!(cause.to_string(), "unrecoverable error: boom");
    }
}
