//! Application configuration management.
//!
//! Handles loading, saving, and accessing the socket configuration: the
//! endpoint and credentials used to connect, reconnection and health check
//! tuning, and logging. Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::constants;
use crate::error::{ScError, ScResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Endpoint and credentials.
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Transient-error retry policy.
    #[serde(default)]
    pub reconnect: ReconnectSettings,

    /// Health monitor timing.
    #[serde(default)]
    pub health: HealthSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoint and credential settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// WebSocket base URL (e.g., "wss://chat.stream-io-api.com/").
    #[serde(default)]
    pub endpoint: String,

    /// Application API key.
    #[serde(default)]
    pub api_key: String,

    /// User to connect as. Empty means an anonymous connection.
    #[serde(default)]
    pub user_id: String,

    /// Optional display name sent with the user details.
    #[serde(default)]
    pub user_name: String,

    /// Static JWT used for user connections.
    #[serde(default)]
    pub token: String,
}

/// Retry policy for transient protocol errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectSettings {
    /// Maximum number of scheduled retries before giving up.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base delay in milliseconds; the n-th retry waits `base * n^2`.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
}

/// Health monitor timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSettings {
    /// How often the monitor wakes up to evaluate the connection.
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_ms: u64,

    /// How often a keep-alive check is sent while connected.
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u64,

    /// Silence after which the connection is considered dead.
    #[serde(default = "default_no_event_threshold")]
    pub no_event_threshold_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_retry_limit() -> u32 {
    constants::RETRY_LIMIT
}

fn default_base_delay() -> u64 {
    constants::RETRY_BASE_DELAY_MS
}

fn default_monitor_interval() -> u64 {
    constants::HEALTH_MONITOR_INTERVAL_MS
}

fn default_check_interval() -> u64 {
    constants::HEALTH_CHECK_INTERVAL_MS
}

fn default_no_event_threshold() -> u64 {
    constants::NO_EVENT_INTERVAL_THRESHOLD_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            retry_limit: default_retry_limit(),
            base_delay_ms: default_base_delay(),
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            monitor_interval_ms: default_monitor_interval(),
            check_interval_ms: default_check_interval(),
            no_event_threshold_ms: default_no_event_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> ScResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> ScResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&contents)?;
        config.connection.endpoint = Self::sanitize_endpoint(&config.connection.endpoint);
        Ok(config)
    }

    /// Save configuration to the default config file path.
    pub fn save_default(&self) -> ScResult<()> {
        let path = Self::default_config_path()?;
        self.save_to_file(&path)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> ScResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ScError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> ScResult<PathBuf> {
        let config_dir = Platform::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> ScResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = Platform::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Check whether an endpoint and API key are configured.
    pub fn is_connection_configured(&self) -> bool {
        !self.connection.endpoint.is_empty() && !self.connection.api_key.is_empty()
    }

    /// Sanitize and normalize a WebSocket endpoint.
    ///
    /// Ensures a ws/wss scheme (http is mapped to ws, https to wss, and a
    /// bare host defaults to wss) and a single trailing slash, so that
    /// `connect` can be appended directly.
    pub fn sanitize_endpoint(endpoint: &str) -> String {
        let trimmed = endpoint.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if let Some(rest) = trimmed.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            format!("ws://{rest}")
        } else if trimmed.starts_with("wss://") || trimmed.starts_with("ws://") {
            trimmed.to_string()
        } else {
            format!("wss://{trimmed}")
        };

        format!("{}/", with_scheme.trim_end_matches('/'))
    }
}

/// Thread-safe configuration holder for shared access.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Save the current configuration to the given path.
    pub async fn save_to(&self, path: &Path) -> ScResult<()> {
        let config = self.inner.read().await;
        config.save_to_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.reconnect.retry_limit, 3);
        assert_eq!(config.reconnect.base_delay_ms, 500);
        assert_eq!(config.health.monitor_interval_ms, 1_000);
        assert_eq!(config.health.check_interval_ms, 10_000);
        assert_eq!(config.health.no_event_threshold_ms, 30_000);
        assert_eq!(config.logging.level, "info");
        assert!(!config.is_connection_configured());
    }

    #[test]
    fn test_sanitize_endpoint() {
        assert_eq!(
            AppConfig::sanitize_endpoint("chat.stream-io-api.com"),
            "wss://chat.stream-io-api.com/"
        );
        assert_eq!(
            AppConfig::sanitize_endpoint("https://chat.stream-io-api.com//"),
            "wss://chat.stream-io-api.com/"
        );
        assert_eq!(
            AppConfig::sanitize_endpoint("  \"http://127.0.0.1:3030\"  "),
            "ws://127.0.0.1:3030/"
        );
        assert_eq!(
            AppConfig::sanitize_endpoint("ws://localhost:8080/"),
            "ws://localhost:8080/"
        );
        assert_eq!(AppConfig::sanitize_endpoint("   "), "");
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = AppConfig::default();
        config.connection.api_key = "key".into();
        config.reconnect.retry_limit = 5;
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.connection.api_key, "key");
        assert_eq!(deserialized.reconnect.retry_limit, 5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [connection]
            endpoint = "wss://example.com/"
            api_key = "abc"

            [health]
            check_interval_ms = 2000
            "#,
        )
        .unwrap();
        assert!(config.is_connection_configured());
        assert_eq!(config.health.check_interval_ms, 2_000);
        assert_eq!(config.health.no_event_threshold_ms, 30_000);
        assert_eq!(config.reconnect.base_delay_ms, 500);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.connection.endpoint = "example.com".into();
        config.connection.user_id = "jc".into();
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.connection.endpoint, "wss://example.com/");
        assert_eq!(loaded.connection.user_id, "jc");
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection\nendpoint = ").unwrap();
        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ScError::Config(_)));
    }

    #[test]
    fn test_effective_log_dir() {
        let mut cfg = AppConfig::default();
        cfg.logging.directory = "/var/log/sc-chat".into();
        assert_eq!(cfg.effective_log_dir().unwrap(), PathBuf::from("/var/log/sc-chat"));
    }

    #[tokio::test]
    async fn test_config_handle() {
        let handle = ConfigHandle::new(AppConfig::default());
        handle.write().await.connection.api_key = "updated".into();
        assert_eq!(handle.read().await.connection.api_key, "updated");
    }
}
