//! Shared test utilities for socket integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use sc_core::error::{ScError, ScResult};
use sc_socket::{
    ChatError, ChatEvent, ConnectedEvent, ConnectionConf, DisconnectCause, EventType,
    EventsParser, NetworkState, SocketFactory, SocketListener, SocketManager, TokenManager,
    Transport,
};

pub const ENDPOINT: &str = "wss://chat.example.com/";
pub const API_KEY: &str = "test-api-key";
pub const TOKEN: &str = "test-jwt";

// ---- Listener ----

/// A notification as seen by a listener, reduced to what tests compare.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Connecting,
    Connected(String),
    Disconnected(DisconnectCause),
    Event(EventType),
    Error(Option<i32>),
}

/// Listener forwarding every notification into a channel.
pub struct RecordingListener {
    tx: mpsc::UnboundedSender<Recorded>,
}

impl SocketListener for RecordingListener {
    fn on_connecting(&self) {
        let _ = self.tx.send(Recorded::Connecting);
    }

    fn on_connected(&self, event: &ConnectedEvent) {
        let _ = self.tx.send(Recorded::Connected(event.connection_id.clone()));
    }

    fn on_disconnected(&self, cause: &DisconnectCause) {
        let _ = self.tx.send(Recorded::Disconnected(cause.clone()));
    }

    fn on_event(&self, event: &ChatEvent) {
        let _ = self.tx.send(Recorded::Event(event.event_type.clone()));
    }

    fn on_error(&self, error: &ChatError) {
        let _ = self.tx.send(Recorded::Error(error.stream_code));
    }
}

pub fn recording_listener() -> (Arc<RecordingListener>, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(RecordingListener { tx }), rx)
}

/// Let spawned tasks (connection setup, delivery) run to completion.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

/// Everything delivered so far.
pub async fn drain(rx: &mut mpsc::UnboundedReceiver<Recorded>) -> Vec<Recorded> {
    settle().await;
    let mut out = Vec::new();
    while let Ok(recorded) = rx.try_recv() {
        out.push(recorded);
    }
    out
}

// ---- Transport ----

/// What a fake transport saw.
#[derive(Default)]
pub struct TransportLog {
    pub sent: Mutex<Vec<ChatEvent>>,
    pub closed: Mutex<Option<(u16, String)>>,
}

impl TransportLog {
    pub fn sent(&self) -> Vec<ChatEvent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Option<(u16, String)> {
        self.closed.lock().unwrap().clone()
    }
}

struct FakeTransport {
    log: Arc<TransportLog>,
}

impl Transport for FakeTransport {
    fn send(&self, event: &ChatEvent) -> bool {
        if self.log.closed().is_some() {
            return false;
        }
        self.log.sent.lock().unwrap().push(event.clone());
        true
    }

    fn close(&self, code: u16, reason: &str) {
        *self.log.closed.lock().unwrap() = Some((code, reason.to_string()));
    }
}

/// A transport created by [`FakeSocketFactory`].
#[derive(Clone)]
pub struct CreatedSocket {
    pub parser: EventsParser,
    pub conf: ConnectionConf,
    pub token: String,
    pub log: Arc<TransportLog>,
}

impl CreatedSocket {
    /// Acknowledge the handshake with the given connection id.
    pub async fn ack(&self, connection_id: &str) {
        self.parser
            .on_message(&format!(
                r#"{{"type":"connection.ok","connection_id":"{connection_id}","me":{{"id":"jc"}}}}"#
            ))
            .await;
    }

    /// Deliver a server error frame.
    pub async fn server_error(&self, code: i32) {
        self.parser
            .on_message(&format!(
                r#"{{"error":{{"code":{code},"message":"server error {code}","StatusCode":400}}}}"#
            ))
            .await;
    }
}

/// Socket factory recording every transport it hands out.
#[derive(Default)]
pub struct FakeSocketFactory {
    sockets: Mutex<Vec<CreatedSocket>>,
}

impl FakeSocketFactory {
    pub fn count(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    pub fn socket(&self, index: usize) -> CreatedSocket {
        self.sockets.lock().unwrap()[index].clone()
    }

    pub fn last(&self) -> CreatedSocket {
        self.sockets
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no socket created")
    }

    /// Yield until at least `n` sockets exist.
    pub async fn wait_for_sockets(&self, n: usize) {
        for _ in 0..200 {
            if self.count() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} sockets, got {}", self.count());
    }
}

impl SocketFactory for FakeSocketFactory {
    fn create_socket(
        &self,
        parser: EventsParser,
        conf: &ConnectionConf,
        token: &str,
    ) -> Box<dyn Transport> {
        let log = Arc::new(TransportLog::default());
        self.sockets.lock().unwrap().push(CreatedSocket {
            parser,
            conf: conf.clone(),
            token: token.to_string(),
            log: log.clone(),
        });
        Box::new(FakeTransport { log })
    }
}

// ---- Token manager ----

/// Token manager counting loads and expirations.
#[derive(Default)]
pub struct FakeTokenManager {
    pub ensure_calls: AtomicUsize,
    pub expire_calls: AtomicUsize,
    pub fail: AtomicBool,
    expired: AtomicBool,
}

impl FakeTokenManager {
    pub fn failing() -> Self {
        let manager = Self::default();
        manager.fail.store(true, Ordering::SeqCst);
        manager
    }

    pub fn expirations(&self) -> usize {
        self.expire_calls.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenManager for FakeTokenManager {
    async fn ensure_token_loaded(&self) -> ScResult<()> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ScError::Token("backend unreachable".into()));
        }
        self.expired.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn load_sync(&self) -> ScResult<String> {
        self.ensure_token_loaded().await?;
        Ok(TOKEN.to_string())
    }

    fn expire_token(&self) {
        self.expire_calls.fetch_add(1, Ordering::SeqCst);
        self.expired.store(true, Ordering::SeqCst);
    }

    fn token(&self) -> String {
        TOKEN.to_string()
    }

    fn has_token(&self) -> bool {
        !self.expired.load(Ordering::SeqCst)
    }

    fn has_token_provider(&self) -> bool {
        true
    }
}

// ---- Harness ----

/// A socket manager wired to fakes.
pub struct Harness {
    pub manager: SocketManager,
    pub factory: Arc<FakeSocketFactory>,
    pub tokens: Arc<FakeTokenManager>,
    pub network: Arc<NetworkState>,
    pub rx: mpsc::UnboundedReceiver<Recorded>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeTokenManager::default(), true)
    }

    pub fn with(tokens: FakeTokenManager, network_available: bool) -> Self {
        let factory = Arc::new(FakeSocketFactory::default());
        let tokens = Arc::new(tokens);
        let network = Arc::new(NetworkState::new(network_available));
        let manager = SocketManager::builder(ENDPOINT, API_KEY)
            .with_socket_factory(factory.clone())
            .with_token_manager(tokens.clone())
            .with_network_state(network.clone())
            .build();
        let (listener, rx) = recording_listener();
        manager.add_listener(listener);
        Self {
            manager,
            factory,
            tokens,
            network,
            rx,
        }
    }

    pub async fn drain(&mut self) -> Vec<Recorded> {
        drain(&mut self.rx).await
    }

    /// Connect as `jc` and complete the handshake.
    pub async fn connected(&mut self) -> CreatedSocket {
        self.manager
            .connect_user(sc_socket::User::new("jc").with_name("Jc"))
            .await;
        self.factory.wait_for_sockets(1).await;
        let socket = self.factory.last();
        socket.ack("conn-1").await;
        settle().await;
        socket
    }
}
