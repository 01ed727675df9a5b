//! Socket transport.
//!
//! `SocketFactory` opens a transport for a connection configuration and
//! wires its frames into an `EventsParser`. `WsSocketFactory` is the
//! WebSocket implementation: each transport owns one I/O task that reads
//! frames into the parser and writes queued outbound frames.

use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use sc_core::constants::{CLIENT_IDENTIFIER, OUTBOUND_QUEUE_CAPACITY};
use sc_core::error::{ScError, ScResult};

use crate::conf::ConnectionConf;
use crate::events::ChatEvent;
use crate::parser::EventsParser;

/// A live bidirectional connection.
pub trait Transport: Send + Sync {
    /// Queue an event for sending. Returns `false` if the transport cannot take it.
    fn send(&self, event: &ChatEvent) -> bool;

    /// Close the connection with a WebSocket close code.
    fn close(&self, code: u16, reason: &str);
}

/// Opens transports.
pub trait SocketFactory: Send + Sync {
    fn create_socket(
        &self,
        parser: EventsParser,
        conf: &ConnectionConf,
        token: &str,
    ) -> Box<dyn Transport>;
}

enum Outbound {
    Frame(String),
    Close(u16, String),
}

/// `SocketFactory` backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Default)]
pub struct WsSocketFactory;

impl WsSocketFactory {
    pub fn new() -> Self {
        Self
    }

    /// Build the connect URL for a configuration.
    ///
    /// `{endpoint}connect?json=...&api_key=...` plus either the anonymous
    /// auth type or the JWT and its auth type.
    pub fn build_url(conf: &ConnectionConf, token: &str) -> ScResult<String> {
        let payload = json!({
            "user_details": conf.user_details(),
            "user_id": conf.user_id(),
            "server_determines_connection_id": true,
            "X-Stream-Client": CLIENT_IDENTIFIER,
        });

        let base = Url::parse(conf.endpoint())
            .map_err(|e| ScError::Config(format!("invalid endpoint {}: {e}", conf.endpoint())))?;
        let mut url = base
            .join("connect")
            .map_err(|e| ScError::Config(format!("invalid endpoint {}: {e}", conf.endpoint())))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("json", &payload.to_string())
                .append_pair("api_key", conf.api_key());
            match conf {
                ConnectionConf::Anonymous { .. } => {
                    query.append_pair("stream-auth-type", "anonymous");
                }
                ConnectionConf::User { .. } => {
                    query
                        .append_pair("authorization", token)
                        .append_pair("stream-auth-type", "jwt");
                }
            }
        }
        Ok(url.into())
    }
}

impl SocketFactory for WsSocketFactory {
    fn create_socket(
        &self,
        parser: EventsParser,
        conf: &ConnectionConf,
        token: &str,
    ) -> Box<dyn Transport> {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let url = Self::build_url(conf, token);
        info!(
            "opening socket to {} (user: {}, reconnection: {})",
            conf.endpoint(),
            conf.user_id(),
            conf.is_reconnection()
        );
        let task = tokio::spawn(async move {
            match url {
                Ok(url) => run_socket(url, parser, rx).await,
                Err(e) => parser.on_failure(e).await,
            }
        });
        Box::new(WsTransport {
            tx,
            task,
            closed: AtomicBool::new(false),
        })
    }
}

/// Transport handle; the connection itself lives in the I/O task.
struct WsTransport {
    tx: mpsc::Sender<Outbound>,
    task: JoinHandle<()>,
    closed: AtomicBool,
}

impl Transport for WsTransport {
    fn send(&self, event: &ChatEvent) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to serialize {} event: {e}", event.event_type);
                return false;
            }
        };
        self.tx.try_send(Outbound::Frame(text)).is_ok()
    }

    fn close(&self, code: u16, reason: &str) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self
            .tx
            .try_send(Outbound::Close(code, reason.to_string()))
            .is_err()
        {
            // Queue full or task gone; tear the task down directly.
            self.task.abort();
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            debug!("transport dropped without close, aborting i/o task");
            self.task.abort();
        }
    }
}

async fn run_socket(url: String, parser: EventsParser, mut rx: mpsc::Receiver<Outbound>) {
    let (stream, _) = match connect_async(url.as_str()).await {
        Ok(connection) => connection,
        Err(e) => {
            parser.on_failure(e).await;
            return;
        }
    };
    parser.on_open();
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Frame(text)) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        parser.on_failure(e).await;
                        break;
                    }
                }
                Some(Outbound::Close(code, reason)) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    parser.close_by_client();
                    if let Err(e) = write.send(Message::Close(Some(frame))).await {
                        debug!("close frame not sent: {e}");
                    }
                    break;
                }
                None => {
                    let _ = write.close().await;
                    break;
                }
            },
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => parser.on_message(text.as_str()).await,
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => parser.on_message(text).await,
                    Err(e) => parser.on_failure(e).await,
                },
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((u16::from(CloseCode::Status), String::new()));
                    parser.on_closed(code, &reason).await;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    parser.on_failure(e).await;
                    break;
                }
                None => {
                    parser.on_closed(u16::from(CloseCode::Abnormal), "stream ended").await;
                    break;
                }
            },
        }
    }
    debug!("socket i/o task finished (generation {})", parser.generation());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::User;

    fn query(url: &str) -> Vec<(String, String)> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_build_url_anonymous() {
        let conf = ConnectionConf::anonymous("wss://chat.example.com/", "key123");
        let url = WsSocketFactory::build_url(&conf, "ignored").unwrap();
        assert!(url.starts_with("wss://chat.example.com/connect?json="));

        let pairs = query(&url);
        assert_eq!(pairs[1], ("api_key".into(), "key123".into()));
        assert_eq!(pairs[2], ("stream-auth-type".into(), "anonymous".into()));
        assert!(!pairs.iter().any(|(k, _)| k == "authorization"));

        let payload: serde_json::Value = serde_json::from_str(&pairs[0].1).unwrap();
        assert_eq!(payload["user_id"], "!anon");
        assert_eq!(payload["server_determines_connection_id"], true);
        assert_eq!(payload["X-Stream-Client"], CLIENT_IDENTIFIER);
    }

    #[test]
    fn test_build_url_user() {
        let conf = ConnectionConf::user(
            "wss://chat.example.com/",
            "key123",
            User::new("jc").with_name("Jc"),
        );
        let pairs = query(&WsSocketFactory::build_url(&conf, "jwt-token").unwrap());
        assert_eq!(pairs[2], ("authorization".into(), "jwt-token".into()));
        assert_eq!(pairs[3], ("stream-auth-type".into(), "jwt".into()));

        let payload: serde_json::Value = serde_json::from_str(&pairs[0].1).unwrap();
        assert_eq!(payload["user_id"], "jc");
        assert_eq!(payload["user_details"]["name"], "Jc");
    }

    #[test]
    fn test_build_url_reconnection_sends_only_id() {
        let conf = ConnectionConf::user(
            "wss://chat.example.com/",
            "key123",
            User::new("jc").with_name("Jc"),
        )
        .as_reconnection_conf();
        let pairs = query(&WsSocketFactory::build_url(&conf, "jwt").unwrap());
        let payload: serde_json::Value = serde_json::from_str(&pairs[0].1).unwrap();
        assert_eq!(payload["user_details"], json!({ "id": "jc" }));
    }

    #[test]
    fn test_build_url_rejects_bad_endpoint() {
        let conf = ConnectionConf::anonymous("not a url", "key");
        assert!(matches!(
            WsSocketFactory::build_url(&conf, ""),
            Err(ScError::Config(_))
        ));
    }
}
