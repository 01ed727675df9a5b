//! Authentication token management.
//!
//! The socket never builds tokens itself. A `TokenProvider` supplied by the
//! host loads them, and `TokenManagerImpl` caches the result until the socket
//! reports an authentication error and expires it.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use sc_core::error::{ScError, ScResult};

/// Loads a fresh token, typically from the host's backend.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn load_token(&self) -> anyhow::Result<String>;
}

/// Provider for a fixed, pre-issued token.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn load_token(&self) -> anyhow::Result<String> {
        if self.token.is_empty() {
            anyhow::bail!("static token is empty");
        }
        Ok(self.token.clone())
    }
}

/// Token cache consulted before every user connection.
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Load a token if none is cached.
    async fn ensure_token_loaded(&self) -> ScResult<()>;

    /// Load a new token, replacing any cached one.
    async fn load_sync(&self) -> ScResult<String>;

    /// Drop the cached token so the next connection loads a new one.
    fn expire_token(&self);

    /// The cached token, or an empty string.
    fn token(&self) -> String;

    fn has_token(&self) -> bool;

    fn has_token_provider(&self) -> bool;
}

/// Default `TokenManager` backed by a `TokenProvider`.
pub struct TokenManagerImpl {
    provider: Option<Arc<dyn TokenProvider>>,
    token: RwLock<String>,
    load_lock: Mutex<()>,
}

impl TokenManagerImpl {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider: Some(provider),
            token: RwLock::new(String::new()),
            load_lock: Mutex::new(()),
        }
    }

    /// A manager with no provider; only anonymous connections will work.
    pub fn without_provider() -> Self {
        Self {
            provider: None,
            token: RwLock::new(String::new()),
            load_lock: Mutex::new(()),
        }
    }

    async fn load_locked(&self) -> ScResult<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ScError::Token("no token provider configured".into()))?;
        let token = provider
            .load_token()
            .await
            .map_err(|e| ScError::Token(format!("failed to load token: {e}")))?;
        if let Ok(mut cached) = self.token.write() {
            cached.clone_from(&token);
        }
        info!("token loaded");
        Ok(token)
    }
}

#[async_trait]
impl TokenManager for TokenManagerImpl {
    async fn ensure_token_loaded(&self) -> ScResult<()> {
        // Concurrent callers wait for the first load instead of racing it.
        let _guard = self.load_lock.lock().await;
        if self.has_token() {
            return Ok(());
        }
        self.load_locked().await.map(|_| ())
    }

    async fn load_sync(&self) -> ScResult<String> {
        let _guard = self.load_lock.lock().await;
        self.load_locked().await
    }

    fn expire_token(&self) {
        match self.token.write() {
            Ok(mut token) => {
                debug!("token expired");
                token.clear();
            }
            Err(_) => warn!("token cache poisoned, cannot expire token"),
        }
    }

    fn token(&self) -> String {
        self.token.read().map(|t| t.clone()).unwrap_or_default()
    }

    fn has_token(&self) -> bool {
        self.token.read().map(|t| !t.is_empty()).unwrap_or(false)
    }

    fn has_token_provider(&self) -> bool {
        self.provider.is_some()
    }
}
