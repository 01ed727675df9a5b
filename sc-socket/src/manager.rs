//! Socket connection manager.
//!
//! Owns the connection state machine for the chat socket. Every state
//! change goes through `set_state`, which compares by value and runs the
//! transition's side effects while the core lock is held:
//! - tearing down the current transport and parser
//! - starting, stopping or alerting the health monitor
//! - forgetting the connection intent and unsubscribing from the network
//! - queueing listener notifications
//!
//! Transport setup, scheduled retries and listener delivery all run on
//! their own tasks and re-enter through the same lock.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use sc_core::config::{AppConfig, ReconnectSettings};
use sc_core::constants::{self, CODE_CLOSE_SOCKET_FROM_CLIENT};
use sc_core::{ChatError, ChatErrorCode};

use crate::conf::{ConnectionConf, User};
use crate::events::{ChatEvent, ConnectedEvent};
use crate::health::{HealthCallback, HealthCheckConfig, HealthMonitor};
use crate::listener::{ListenerId, ListenerRegistry, Notification, SocketListener};
use crate::network::{NetworkState, NetworkStateListener, NetworkStateProvider};
use crate::parser::{EventSink, EventsParser};
use crate::state::{ConnectionState, DisconnectCause};
use crate::token::{TokenManager, TokenManagerImpl};
use crate::transport::{SocketFactory, Transport, WsSocketFactory};

/// Retry policy for transient protocol errors.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of scheduled retries.
    pub retry_limit: u32,
    /// The n-th retry waits `base_delay * n^2`.
    pub base_delay: Duration,
}

impl ReconnectConfig {
    /// Delay before the retry scheduled at `attempt` previous attempts.
    ///
    /// With the defaults: 0 ms, 500 ms, 2000 ms.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_mul(attempt))
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            retry_limit: constants::RETRY_LIMIT,
            base_delay: Duration::from_millis(constants::RETRY_BASE_DELAY_MS),
        }
    }
}

impl From<&ReconnectSettings> for ReconnectConfig {
    fn from(settings: &ReconnectSettings) -> Self {
        Self {
            retry_limit: settings.retry_limit,
            base_delay: Duration::from_millis(settings.base_delay_ms),
        }
    }
}

/// How a coded socket error affects the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Protocol hiccup; retried with bounded backoff, state unchanged.
    Transient,
    /// Credentials or configuration are wrong; give up until a new connect.
    Permanent,
    /// Anything else; disconnect temporarily and let recovery kick in.
    Temporary,
}

impl ErrorClass {
    pub fn classify(code: i32) -> Self {
        match ChatErrorCode::from_code(code) {
            Some(
                ChatErrorCode::ParserError
                | ChatErrorCode::CantParseConnectionEvent
                | ChatErrorCode::CantParseEvent
                | ChatErrorCode::UnableToParseSocketEvent
                | ChatErrorCode::NoErrorBody,
            ) => Self::Transient,
            Some(
                ChatErrorCode::UndefinedToken
                | ChatErrorCode::InvalidToken
                | ChatErrorCode::TokenExpired
                | ChatErrorCode::ApiKeyNotFound
                | ChatErrorCode::ValidationError,
            ) => Self::Permanent,
            _ => Self::Temporary,
        }
    }
}

/// Mutable connection state, only touched under `SocketInner::core`.
struct SocketCore {
    state: ConnectionState,
    /// Last requested connection; the reconnection intent.
    connection_conf: Option<ConnectionConf>,
    socket: Option<Box<dyn Transport>>,
    events_parser: Option<EventsParser>,
    /// Token load and transport creation for the current generation.
    connection_job: Option<JoinHandle<()>>,
    /// Pending transient-error retry.
    retry_job: Option<JoinHandle<()>>,
    reconnection_attempts: u32,
    /// Bumped for every transport; stale parser callbacks are dropped.
    generation: u64,
}

struct SocketInner {
    endpoint: String,
    api_key: String,
    token_manager: Arc<dyn TokenManager>,
    socket_factory: Arc<dyn SocketFactory>,
    network_state: Arc<dyn NetworkStateProvider>,
    network_listener: Arc<dyn NetworkStateListener>,
    reconnect_config: ReconnectConfig,
    health_monitor: HealthMonitor,
    listeners: ListenerRegistry,
    core: Mutex<SocketCore>,
    state_tx: watch::Sender<ConnectionState>,
    weak_self: Weak<SocketInner>,
}

/// Chat socket connection manager.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct SocketManager {
    inner: Arc<SocketInner>,
}

/// Builder for [`SocketManager`].
pub struct SocketManagerBuilder {
    endpoint: String,
    api_key: String,
    token_manager: Option<Arc<dyn TokenManager>>,
    socket_factory: Option<Arc<dyn SocketFactory>>,
    network_state: Option<Arc<dyn NetworkStateProvider>>,
    reconnect_config: ReconnectConfig,
    health_config: HealthCheckConfig,
}

impl SocketManagerBuilder {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            token_manager: None,
            socket_factory: None,
            network_state: None,
            reconnect_config: ReconnectConfig::default(),
            health_config: HealthCheckConfig::default(),
        }
    }

    /// Endpoint, API key, retry and health settings from the app config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.connection.endpoint, &config.connection.api_key)
            .with_reconnect_config(ReconnectConfig::from(&config.reconnect))
            .with_health_config(HealthCheckConfig::from(&config.health))
    }

    pub fn with_token_manager(mut self, token_manager: Arc<dyn TokenManager>) -> Self {
        self.token_manager = Some(token_manager);
        self
    }

    pub fn with_socket_factory(mut self, socket_factory: Arc<dyn SocketFactory>) -> Self {
        self.socket_factory = Some(socket_factory);
        self
    }

    pub fn with_network_state(mut self, network_state: Arc<dyn NetworkStateProvider>) -> Self {
        self.network_state = Some(network_state);
        self
    }

    /// Set custom reconnection configuration.
    pub fn with_reconnect_config(mut self, config: ReconnectConfig) -> Self {
        self.reconnect_config = config;
        self
    }

    /// Set custom health check configuration.
    pub fn with_health_config(mut self, config: HealthCheckConfig) -> Self {
        self.health_config = config;
        self
    }

    /// Build the manager. Must be called within a tokio runtime.
    pub fn build(self) -> SocketManager {
        let initial = ConnectionState::DisconnectedTemporarily(None);
        let (state_tx, _) = watch::channel(initial.clone());
        let token_manager = self
            .token_manager
            .unwrap_or_else(|| Arc::new(TokenManagerImpl::without_provider()));
        let socket_factory = self
            .socket_factory
            .unwrap_or_else(|| Arc::new(WsSocketFactory::new()));
        let network_state = self
            .network_state
            .unwrap_or_else(|| Arc::new(NetworkState::default()));

        let inner = Arc::new_cyclic(|weak: &Weak<SocketInner>| SocketInner {
            endpoint: self.endpoint,
            api_key: self.api_key,
            token_manager,
            socket_factory,
            network_state,
            network_listener: Arc::new(NetworkObserver {
                socket: weak.clone(),
            }),
            reconnect_config: self.reconnect_config,
            health_monitor: HealthMonitor::new(
                self.health_config,
                Arc::new(HealthObserver {
                    socket: weak.clone(),
                }),
            ),
            listeners: ListenerRegistry::new(),
            core: Mutex::new(SocketCore {
                state: initial,
                connection_conf: None,
                socket: None,
                events_parser: None,
                connection_job: None,
                retry_job: None,
                reconnection_attempts: 0,
                generation: 0,
            }),
            state_tx,
            weak_self: weak.clone(),
        });
        SocketManager { inner }
    }
}

impl SocketManager {
    pub fn builder(endpoint: impl Into<String>, api_key: impl Into<String>) -> SocketManagerBuilder {
        SocketManagerBuilder::new(endpoint, api_key)
    }

    /// Connect without a user.
    pub async fn connect_anonymously(&self) {
        let conf = ConnectionConf::anonymous(&self.inner.endpoint, &self.inner.api_key);
        self.inner.connect(conf).await;
    }

    /// Connect as `user`. A no-op while already connecting or connected as the same user.
    pub async fn connect_user(&self, user: User) {
        let conf = ConnectionConf::user(&self.inner.endpoint, &self.inner.api_key, user);
        self.inner.connect(conf).await;
    }

    /// Manually reconnect without a user, resetting the retry counter.
    pub async fn reconnect_anonymously(&self) {
        let conf = ConnectionConf::anonymous(&self.inner.endpoint, &self.inner.api_key);
        self.inner.manual_reconnect(conf).await;
    }

    /// Manually reconnect as `user`, resetting the retry counter.
    pub async fn reconnect_user(&self, user: User) {
        let conf = ConnectionConf::user(&self.inner.endpoint, &self.inner.api_key, user);
        self.inner.manual_reconnect(conf).await;
    }

    /// Close the connection for good and forget the connection intent.
    pub async fn disconnect(&self) {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        inner.cancel_jobs(&mut core);
        core.reconnection_attempts = 0;
        inner.set_state(&mut core, ConnectionState::DisconnectedPermanently(None));
    }

    /// Close the connection but keep the intent, e.g. while the app is paused.
    pub async fn release_connection(&self) {
        let inner = &self.inner;
        let mut core = inner.core.lock().await;
        inner.cancel_jobs(&mut core);
        inner.set_state(&mut core, ConnectionState::DisconnectedByRequest);
    }

    /// Handshake completed on the current transport.
    pub async fn on_connection_resolved(&self, event: ConnectedEvent) {
        let mut core = self.inner.core.lock().await;
        self.inner
            .set_state(&mut core, ConnectionState::Connected(event));
    }

    /// An event arrived on the current transport.
    pub async fn on_event(&self, event: ChatEvent) {
        let _core = self.inner.core.lock().await;
        self.inner.dispatch_event(event);
    }

    /// Report and classify a socket error.
    pub async fn on_socket_error(&self, error: ChatError) {
        let mut core = self.inner.core.lock().await;
        self.inner.handle_error(&mut core, error);
    }

    /// Send an event over the live transport. Returns `false` when there is none.
    pub async fn send_event(&self, event: &ChatEvent) -> bool {
        let core = self.inner.core.lock().await;
        match core.socket.as_ref() {
            Some(socket) => socket.send(event),
            None => {
                debug!("no socket, dropping outbound {} event", event.event_type);
                false
            }
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SocketListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    /// Returns whether the listener was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to connection state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Scheduled transient-error retries since the last reset.
    pub async fn reconnection_attempts(&self) -> u32 {
        self.inner.core.lock().await.reconnection_attempts
    }

    /// The stored connection intent, if any.
    pub async fn connection_conf(&self) -> Option<ConnectionConf> {
        self.inner.core.lock().await.connection_conf.clone()
    }
}

impl SocketInner {
    async fn connect(&self, conf: ConnectionConf) {
        let mut core = self.core.lock().await;
        let in_progress = matches!(
            core.state,
            ConnectionState::Connecting | ConnectionState::Connected(_)
        );
        if in_progress && core.connection_conf.as_ref() == Some(&conf) {
            debug!("already connecting or connected as {}, skipping", conf.user_id());
            return;
        }

        let network_available = self.network_state.is_connected();
        info!(
            "connect as {} (network available: {network_available})",
            conf.user_id()
        );
        self.cancel_jobs(&mut core);
        self.shutdown_socket_connection(&mut core);
        core.reconnection_attempts = 0;
        core.connection_conf = Some(conf.clone());
        if network_available {
            self.setup_socket(&mut core, Some(conf));
        } else {
            self.set_state(&mut core, ConnectionState::NetworkDisconnected);
        }
        self.network_state
            .subscribe(Arc::clone(&self.network_listener));
    }

    async fn manual_reconnect(&self, conf: ConnectionConf) {
        let mut core = self.core.lock().await;
        info!("manual reconnect as {}", conf.user_id());
        self.cancel_jobs(&mut core);
        core.reconnection_attempts = 0;
        core.connection_conf = Some(conf.clone());
        self.network_state
            .subscribe(Arc::clone(&self.network_listener));
        self.reconnect(&mut core, Some(conf));
    }

    /// Tear down the transport and reopen with the reconnection variant of `conf`.
    fn reconnect(&self, core: &mut SocketCore, conf: Option<ConnectionConf>) {
        self.shutdown_socket_connection(core);
        self.setup_socket(core, conf.map(|c| c.as_reconnection_conf()));
    }

    fn setup_socket(&self, core: &mut SocketCore, conf: Option<ConnectionConf>) {
        let Some(conf) = conf else {
            debug!("no connection intent, cannot set up socket");
            self.set_state(core, ConnectionState::DisconnectedPermanently(None));
            return;
        };

        core.generation += 1;
        let generation = core.generation;
        let socket = self.weak_self.clone();
        let token_manager = Arc::clone(&self.token_manager);
        debug!("setting up socket (generation {generation})");

        core.connection_job = Some(tokio::spawn(async move {
            let token = match &conf {
                ConnectionConf::Anonymous { .. } => String::new(),
                ConnectionConf::User { .. } => match token_manager.ensure_token_loaded().await {
                    Ok(()) => token_manager.token(),
                    Err(e) => {
                        if let Some(socket) = socket.upgrade() {
                            socket.on_setup_failed(generation, e.to_string()).await;
                        }
                        return;
                    }
                },
            };
            if let Some(socket) = socket.upgrade() {
                socket.open_socket(generation, conf, token).await;
            }
        }));
        self.set_state(core, ConnectionState::Connecting);
    }

    async fn open_socket(&self, generation: u64, conf: ConnectionConf, token: String) {
        let mut core = self.core.lock().await;
        if core.generation != generation {
            debug!("connection setup for generation {generation} superseded");
            return;
        }
        // Detach our own handle so later teardown does not abort this task.
        core.connection_job.take();

        let sink: Weak<dyn EventSink> = self.weak_self.clone();
        let parser = EventsParser::new(generation, sink);
        let socket = self.socket_factory.create_socket(parser.clone(), &conf, &token);
        core.events_parser = Some(parser);
        core.socket = Some(socket);
    }

    async fn on_setup_failed(&self, generation: u64, cause: String) {
        let mut core = self.core.lock().await;
        if core.generation != generation {
            return;
        }
        core.connection_job.take();
        warn!("connection setup failed: {cause}");
        self.handle_error(
            &mut core,
            ChatError::network_with_cause(ChatErrorCode::NetworkFailed, cause),
        );
    }

    fn shutdown_socket_connection(&self, core: &mut SocketCore) {
        if let Some(job) = core.connection_job.take() {
            job.abort();
        }
        if let Some(parser) = core.events_parser.take() {
            parser.close_by_client();
        }
        if let Some(socket) = core.socket.take() {
            debug!("closing socket (generation {})", core.generation);
            socket.close(CODE_CLOSE_SOCKET_FROM_CLIENT, "Connection close by client");
        }
    }

    fn cancel_jobs(&self, core: &mut SocketCore) {
        if let Some(job) = core.connection_job.take() {
            job.abort();
        }
        if let Some(job) = core.retry_job.take() {
            debug!("cancelling pending retry");
            job.abort();
        }
    }

    /// The single state mutation entry point.
    fn set_state(&self, core: &mut SocketCore, new_state: ConnectionState) {
        if core.state == new_state {
            return;
        }
        info!("socket state: {} -> {}", core.state, new_state);
        core.state = new_state.clone();

        match &new_state {
            ConnectionState::Connecting => {
                self.health_monitor.stop();
                self.listeners.notify(Notification::Connecting);
            }
            ConnectionState::Connected(event) => {
                core.reconnection_attempts = 0;
                self.health_monitor.start();
                self.listeners.notify(Notification::Connected(event.clone()));
            }
            ConnectionState::NetworkDisconnected => {
                self.shutdown_socket_connection(core);
                self.health_monitor.stop();
                self.listeners.notify(Notification::Disconnected(
                    DisconnectCause::NetworkNotAvailable,
                ));
            }
            ConnectionState::DisconnectedByRequest => {
                self.shutdown_socket_connection(core);
                self.health_monitor.stop();
                self.listeners.notify(Notification::Disconnected(
                    DisconnectCause::ConnectionReleased,
                ));
            }
            ConnectionState::DisconnectedTemporarily(error) => {
                self.shutdown_socket_connection(core);
                if let Some(job) = core.retry_job.take() {
                    job.abort();
                }
                self.health_monitor.on_disconnected();
                self.listeners.notify(Notification::Disconnected(DisconnectCause::Error(
                    error.clone(),
                )));
            }
            ConnectionState::DisconnectedPermanently(error) => {
                self.shutdown_socket_connection(core);
                if let Some(job) = core.retry_job.take() {
                    job.abort();
                }
                core.connection_conf = None;
                self.network_state.unsubscribe(&self.network_listener);
                self.health_monitor.stop();
                self.listeners.notify(Notification::Disconnected(
                    DisconnectCause::UnrecoverableError(error.clone()),
                ));
            }
        }
        self.state_tx.send_replace(new_state);
    }

    fn dispatch_event(&self, event: ChatEvent) {
        self.health_monitor.ack();
        self.listeners.notify(Notification::Event(event));
    }

    /// Report an error and apply its classification.
    fn handle_error(&self, core: &mut SocketCore, error: ChatError) {
        if matches!(core.state, ConnectionState::DisconnectedPermanently(_)) {
            debug!("socket permanently disconnected, ignoring error: {error}");
            return;
        }
        error!("socket error: {error}");
        self.listeners.notify(Notification::Error(error.clone()));

        let Some(code) = error.stream_code else {
            return;
        };
        if ChatErrorCode::is_authentication_error(code) {
            info!("authentication error {code}, expiring token");
            self.token_manager.expire_token();
        }
        match ErrorClass::classify(code) {
            ErrorClass::Transient => self.schedule_retry(core),
            ErrorClass::Permanent => {
                self.set_state(core, ConnectionState::DisconnectedPermanently(Some(error)));
            }
            ErrorClass::Temporary => {
                self.set_state(core, ConnectionState::DisconnectedTemporarily(Some(error)));
            }
        }
    }

    fn schedule_retry(&self, core: &mut SocketCore) {
        let attempt = core.reconnection_attempts;
        if attempt >= self.reconnect_config.retry_limit {
            warn!(
                "retry limit ({}) reached, waiting for network or manual reconnect",
                self.reconnect_config.retry_limit
            );
            return;
        }
        if let Some(job) = core.retry_job.take() {
            job.abort();
        }

        let delay = self.reconnect_config.retry_delay(attempt);
        warn!(
            "scheduling reconnect attempt {} in {}ms",
            attempt + 1,
            delay.as_millis()
        );
        let socket = self.weak_self.clone();
        core.retry_job = Some(tokio::spawn(async move {
            sleep(delay).await;
            if let Some(socket) = socket.upgrade() {
                socket.run_scheduled_retry().await;
            }
        }));
    }

    async fn run_scheduled_retry(&self) {
        let mut core = self.core.lock().await;
        core.retry_job.take();
        let conf = core.connection_conf.clone();
        self.reconnect(&mut core, conf);
        core.reconnection_attempts += 1;
    }

    /// Lock the core and check a parser callback belongs to the current transport.
    async fn current_core(&self, generation: u64) -> Option<tokio::sync::MutexGuard<'_, SocketCore>> {
        let core = self.core.lock().await;
        if core.generation == generation && core.events_parser.is_some() {
            Some(core)
        } else {
            debug!("dropping callback from stale parser (generation {generation})");
            None
        }
    }
}

#[async_trait]
impl EventSink for SocketInner {
    async fn on_connection_resolved(&self, generation: u64, event: ConnectedEvent) {
        if let Some(mut core) = self.current_core(generation).await {
            info!("connection resolved (connection id {})", event.connection_id);
            self.set_state(&mut core, ConnectionState::Connected(event));
        }
    }

    async fn on_event(&self, generation: u64, event: ChatEvent) {
        if let Some(_core) = self.current_core(generation).await {
            self.dispatch_event(event);
        }
    }

    async fn on_socket_error(&self, generation: u64, error: ChatError) {
        if let Some(mut core) = self.current_core(generation).await {
            self.handle_error(&mut core, error);
        }
    }
}

/// Health monitor callbacks routed into the socket.
struct HealthObserver {
    socket: Weak<SocketInner>,
}

#[async_trait]
impl HealthCallback for HealthObserver {
    async fn reconnect(&self) {
        let Some(socket) = self.socket.upgrade() else {
            return;
        };
        let mut core = socket.core.lock().await;
        if matches!(core.state, ConnectionState::DisconnectedTemporarily(_)) {
            info!("health monitor reconnecting socket");
            let conf = core.connection_conf.clone();
            socket.reconnect(&mut core, conf);
        }
    }

    async fn check(&self) {
        let Some(socket) = self.socket.upgrade() else {
            return;
        };
        let core = socket.core.lock().await;
        if let ConnectionState::Connected(event) = &core.state {
            let check = event.keep_alive_event();
            let sent = core.socket.as_ref().is_some_and(|s| s.send(&check));
            debug!("keep-alive check sent: {sent}");
        }
    }
}

/// Network transitions routed into the socket.
struct NetworkObserver {
    socket: Weak<SocketInner>,
}

#[async_trait]
impl NetworkStateListener for NetworkObserver {
    async fn on_connected(&self) {
        let Some(socket) = self.socket.upgrade() else {
            return;
        };
        let mut core = socket.core.lock().await;
        info!("network connected, socket state: {}", core.state);
        if matches!(
            core.state,
            ConnectionState::DisconnectedTemporarily(_) | ConnectionState::NetworkDisconnected
        ) {
            let conf = core.connection_conf.clone();
            socket.reconnect(&mut core, conf);
        }
    }

    async fn on_disconnected(&self) {
        let Some(socket) = self.socket.upgrade() else {
            return;
        };
        let mut core = socket.core.lock().await;
        info!("network disconnected, socket state: {}", core.state);
        socket.health_monitor.stop();
        if matches!(
            core.state,
            ConnectionState::Connected(_) | ConnectionState::Connecting
        ) {
            socket.set_state(&mut core, ConnectionState::NetworkDisconnected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_sequence() {
        let config = ReconnectConfig::default();
        assert_eq!(config.retry_delay(0), Duration::ZERO);
        assert_eq!(config.retry_delay(1), Duration::from_millis(500));
        assert_eq!(config.retry_delay(2), Duration::from_millis(2000));
        assert_eq!(config.retry_delay(3), Duration::from_millis(4500));
    }

    #[test]
    fn test_reconnect_config_from_settings() {
        let settings = ReconnectSettings {
            retry_limit: 5,
            base_delay_ms: 100,
        };
        let config = ReconnectConfig::from(&settings);
        assert_eq!(config.retry_limit, 5);
        assert_eq!(config.retry_delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_error_classification() {
        for code in [1001, 1004, 1005, 1008, 1009] {
            assert_eq!(ErrorClass::classify(code), ErrorClass::Transient, "code {code}");
        }
        for code in [1007, 1006, 40, 2, 4] {
            assert_eq!(ErrorClass::classify(code), ErrorClass::Permanent, "code {code}");
        }
        for code in [1000, 1002, 1003, 5, 41, 17, -1] {
            assert_eq!(ErrorClass::classify(code), ErrorClass::Temporary, "code {code}");
        }
    }

    #[tokio::test]
    async fn test_initial_state() {
        let manager = SocketManager::builder("wss://chat.example.com/", "key").build();
        assert_eq!(manager.state(), ConnectionState::DisconnectedTemporarily(None));
        assert_eq!(manager.reconnection_attempts().await, 0);
        assert!(manager.connection_conf().await.is_none());
        assert!(!manager.send_event(&ChatEvent::new(crate::EventType::HealthCheck)).await);
    }
}
