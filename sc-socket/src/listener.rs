//! Socket listeners and their delivery task.
//!
//! Notifications are snapshotted against the registered listeners when they
//! are emitted and handed to a single delivery task, which calls listeners
//! one after another. Listener code therefore never runs on the transport
//! task or while the socket's state lock is held, and every listener sees
//! notifications in emission order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use sc_core::ChatError;

use crate::events::{ChatEvent, ConnectedEvent};
use crate::state::DisconnectCause;

/// Receives socket lifecycle notifications and events.
///
/// Every method has an empty default so implementors only override what
/// they care about.
pub trait SocketListener: Send + Sync {
    fn on_connecting(&self) {}

    fn on_connected(&self, _event: &ConnectedEvent) {}

    fn on_disconnected(&self, _cause: &DisconnectCause) {}

    fn on_event(&self, _event: &ChatEvent) {}

    fn on_error(&self, _error: &ChatError) {}
}

/// Handle returned by `add_listener`, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A single notification queued for delivery.
#[derive(Debug, Clone)]
pub(crate) enum Notification {
    Connecting,
    Connected(ConnectedEvent),
    Disconnected(DisconnectCause),
    Event(ChatEvent),
    Error(ChatError),
}

impl Notification {
    fn deliver(&self, listener: &dyn SocketListener) {
        match self {
            Self::Connecting => listener.on_connecting(),
            Self::Connected(event) => listener.on_connected(event),
            Self::Disconnected(cause) => listener.on_disconnected(cause),
            Self::Event(event) => listener.on_event(event),
            Self::Error(error) => listener.on_error(error),
        }
    }
}

type Batch = (Notification, Vec<Arc<dyn SocketListener>>);

/// Thread-safe listener set with a dedicated delivery task.
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn SocketListener>)>>,
    next_id: AtomicU64,
    delivery_tx: mpsc::UnboundedSender<Batch>,
}

impl ListenerRegistry {
    /// Create the registry and spawn its delivery task on the current runtime.
    pub(crate) fn new() -> Self {
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        tokio::spawn(deliver_notifications(delivery_rx));
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            delivery_tx,
        }
    }

    pub(crate) fn add(&self, listener: Arc<dyn SocketListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, listener));
        }
        id
    }

    /// Returns whether a listener was removed.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(existing, _)| *existing != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Queue a notification for every listener registered right now.
    pub(crate) fn notify(&self, notification: Notification) {
        let snapshot: Vec<Arc<dyn SocketListener>> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        if snapshot.is_empty() {
            return;
        }
        if self.delivery_tx.send((notification, snapshot)).is_err() {
            debug!("listener delivery task has stopped, dropping notification");
        }
    }
}

async fn deliver_notifications(mut rx: mpsc::UnboundedReceiver<Batch>) {
    while let Some((notification, listeners)) = rx.recv().await {
        for listener in listeners {
            let result = catch_unwind(AssertUnwindSafe(|| notification.deliver(listener.as_ref())));
            if result.is_err() {
                warn!("socket listener panicked while handling {notification:?}");
            }
        }
    }
}
