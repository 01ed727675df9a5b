//! Device network availability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

/// Receives connectivity transitions.
#[async_trait]
pub trait NetworkStateListener: Send + Sync {
    async fn on_connected(&self);

    async fn on_disconnected(&self);
}

/// Source of network availability.
pub trait NetworkStateProvider: Send + Sync {
    fn is_connected(&self) -> bool;

    fn subscribe(&self, listener: Arc<dyn NetworkStateListener>);

    fn unsubscribe(&self, listener: &Arc<dyn NetworkStateListener>);
}

/// Network availability driven by the host application.
///
/// The host reports connectivity through [`NetworkState::set_connected`];
/// subscribers are notified only when the value actually changes.
pub struct NetworkState {
    connected: AtomicBool,
    listeners: Mutex<Vec<Arc<dyn NetworkStateListener>>>,
}

impl NetworkState {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Report a connectivity change and notify subscribers on a transition.
    pub async fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous == connected {
            debug!("network state unchanged (connected: {connected})");
            return;
        }
        info!("network {}", if connected { "connected" } else { "disconnected" });

        let listeners: Vec<Arc<dyn NetworkStateListener>> = match self.listeners.lock() {
            Ok(listeners) => listeners.clone(),
            Err(_) => return,
        };
        for listener in listeners {
            if connected {
                listener.on_connected().await;
            } else {
                listener.on_disconnected().await;
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl Default for NetworkState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkStateProvider for NetworkState {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self, listener: Arc<dyn NetworkStateListener>) {
        if let Ok(mut listeners) = self.listeners.lock() {
            if !listeners
                .iter()
                .any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&listener)))
            {
                listeners.push(listener);
            }
        }
    }

    fn unsubscribe(&self, listener: &Arc<dyn NetworkStateListener>) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners
                .retain(|existing| !std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(listener)));
        }
    }
}
