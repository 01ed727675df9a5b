//! Decoding of socket frames.
//!
//! One `EventsParser` is created per transport. It turns raw text frames
//! into a connection acknowledgement, application events or errors, and
//! forwards them to the socket manager. Every parser is stamped with the
//! generation of the connection it belongs to; the manager ignores anything
//! from an older generation.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use sc_core::{ChatError, ChatErrorCode};

use crate::events::{ChatEvent, ConnectedEvent, EventType};

/// Receiver of parsed frames, implemented by the socket manager.
#[async_trait]
pub(crate) trait EventSink: Send + Sync {
    async fn on_connection_resolved(&self, generation: u64, event: ConnectedEvent);

    async fn on_event(&self, generation: u64, event: ChatEvent);

    async fn on_socket_error(&self, generation: u64, error: ChatError);
}

/// Body of a server `error` frame.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i32,
    #[serde(default)]
    message: String,
    #[serde(rename = "StatusCode", default)]
    status_code: Option<u16>,
}

struct ParserInner {
    generation: u64,
    sink: Weak<dyn EventSink>,
    connection_event_received: AtomicBool,
    closed_by_client: AtomicBool,
}

/// Per-connection frame decoder. Cloning shares the same parser.
#[derive(Clone)]
pub struct EventsParser {
    inner: Arc<ParserInner>,
}

impl std::fmt::Debug for EventsParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventsParser")
            .field("generation", &self.inner.generation)
            .field("closed_by_client", &self.is_closed_by_client())
            .finish()
    }
}

impl EventsParser {
    pub(crate) fn new(generation: u64, sink: Weak<dyn EventSink>) -> Self {
        Self {
            inner: Arc::new(ParserInner {
                generation,
                sink,
                connection_event_received: AtomicBool::new(false),
                closed_by_client: AtomicBool::new(false),
            }),
        }
    }

    /// Connection generation this parser belongs to.
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    /// The transport finished its handshake.
    pub fn on_open(&self) {
        debug!("socket opened (generation {})", self.inner.generation);
    }

    /// Decode a text frame.
    pub async fn on_message(&self, text: &str) {
        if self.is_closed_by_client() {
            return;
        }
        let value: Value = match serde_json::from_str(text) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                self.report(ChatError::network(ChatErrorCode::UnableToParseSocketEvent))
                    .await;
                return;
            }
            Err(e) => {
                self.report(ChatError::network_with_cause(
                    ChatErrorCode::UnableToParseSocketEvent,
                    e,
                ))
                .await;
                return;
            }
        };

        if let Some(error) = value.get("error") {
            let error = match ErrorBody::deserialize(error) {
                Ok(body) => ChatError::from_server(body.code, body.message, body.status_code),
                Err(e) => ChatError::network_with_cause(ChatErrorCode::ParserError, e),
            };
            self.report(error).await;
            return;
        }

        if self.inner.connection_event_received.load(Ordering::SeqCst) {
            match serde_json::from_value::<ChatEvent>(value) {
                Ok(event) => {
                    if let Some(sink) = self.sink() {
                        sink.on_event(self.inner.generation, event).await;
                    }
                }
                Err(e) => {
                    self.report(ChatError::network_with_cause(ChatErrorCode::CantParseEvent, e))
                        .await;
                }
            }
        } else {
            self.handle_first_event(value).await;
        }
    }

    /// The transport failed.
    pub async fn on_failure(&self, cause: impl Display) {
        if self.is_closed_by_client() {
            return;
        }
        warn!("socket failure: {cause}");
        self.report(ChatError::network_with_cause(ChatErrorCode::SocketFailure, cause))
            .await;
    }

    /// The remote end closed the transport. Any code counts, 1000 included;
    /// a close started here goes through `close_by_client` instead.
    pub async fn on_closed(&self, code: u16, reason: &str) {
        if self.is_closed_by_client() {
            return;
        }
        self.report(ChatError::network_with_cause(
            ChatErrorCode::SocketClosed,
            format!("close code {code}: {reason}"),
        ))
        .await;
    }

    /// Silence this parser; nothing it sees afterwards reaches the manager.
    pub fn close_by_client(&self) {
        self.inner.closed_by_client.store(true, Ordering::SeqCst);
    }

    pub fn is_closed_by_client(&self) -> bool {
        self.inner.closed_by_client.load(Ordering::SeqCst)
    }

    async fn handle_first_event(&self, value: Value) {
        let is_connection_event = value
            .get("type")
            .and_then(Value::as_str)
            .map(|t| EventType::from_str(t).is_connection_event())
            .unwrap_or(false);
        if !is_connection_event {
            self.report(ChatError::network(ChatErrorCode::CantParseConnectionEvent))
                .await;
            return;
        }
        match serde_json::from_value::<ConnectedEvent>(value) {
            Ok(event) => {
                self.inner
                    .connection_event_received
                    .store(true, Ordering::SeqCst);
                if let Some(sink) = self.sink() {
                    sink.on_connection_resolved(self.inner.generation, event).await;
                }
            }
            Err(e) => {
                self.report(ChatError::network_with_cause(
                    ChatErrorCode::CantParseConnectionEvent,
                    e,
                ))
                .await;
            }
        }
    }

    async fn report(&self, error: ChatError) {
        if let Some(sink) = self.sink() {
            sink.on_socket_error(self.inner.generation, error).await;
        }
    }

    fn sink(&self) -> Option<Arc<dyn EventSink>> {
        if self.is_closed_by_client() {
            return None;
        }
        self.inner.sink.upgrade()
    }
}
