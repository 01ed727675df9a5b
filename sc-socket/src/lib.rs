//! Stream Chat Socket - persistent real-time connection manager.
//!
//! This crate provides the socket layer of the chat client:
//! - A connection state machine with exactly-once transition side effects
//! - Health monitoring with keep-alive checks and jittered reconnects
//! - Bounded backoff retries for transient protocol errors
//! - Reaction to device network availability
//! - Listener fan-out on a dedicated delivery task
//! - A WebSocket transport built on tokio-tungstenite

pub mod conf;
pub mod events;
pub mod health;
pub mod listener;
pub mod manager;
pub mod network;
pub mod parser;
pub mod state;
pub mod token;
pub mod transport;

// Re-export key types
pub use conf::{ConnectionConf, User};
pub use events::{ChatEvent, ConnectedEvent, EventType};
pub use health::{HealthCallback, HealthCheckConfig, HealthMonitor};
pub use listener::{ListenerId, SocketListener};
pub use manager::{ErrorClass, ReconnectConfig, SocketManager, SocketManagerBuilder};
pub use network::{NetworkState, NetworkStateListener, NetworkStateProvider};
pub use parser::EventsParser;
pub use state::{ConnectionState, DisconnectCause};
pub use token::{StaticTokenProvider, TokenManager, TokenManagerImpl, TokenProvider};
pub use transport::{SocketFactory, Transport, WsSocketFactory};

pub use sc_core::{ChatError, ChatErrorCode};
