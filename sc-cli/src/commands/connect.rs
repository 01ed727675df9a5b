//! Connect command - open the socket and stream events to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;
use serde_json::json;
use tracing::error;

use sc_core::config::{AppConfig, ConfigHandle};
use sc_core::error::{ScError, ScResult};
use sc_socket::{
    ChatError, ChatEvent, ConnectedEvent, ConnectionState, DisconnectCause, SocketListener,
    SocketManager, SocketManagerBuilder, StaticTokenProvider, TokenManagerImpl, User,
};

use crate::OutputFormat;

/// Command-line values that take precedence over the config file.
pub struct Overrides {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub user: Option<String>,
    pub name: Option<String>,
    pub token: Option<String>,
}

impl Overrides {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(endpoint) = self.endpoint {
            cfg.connection.endpoint = AppConfig::sanitize_endpoint(&endpoint);
        }
        if let Some(api_key) = self.api_key {
            cfg.connection.api_key = api_key;
        }
        if let Some(user) = self.user {
            cfg.connection.user_id = user;
        }
        if let Some(name) = self.name {
            cfg.connection.user_name = name;
        }
        if let Some(token) = self.token {
            cfg.connection.token = token;
        }
    }
}

/// Prints every socket notification.
struct PrintingListener {
    format: OutputFormat,
}

impl PrintingListener {
    fn emit(&self, label: console::StyledObject<&str>, kind: &str, detail: String) {
        match self.format {
            OutputFormat::Text => println!("  {label} {detail}"),
            OutputFormat::Json => println!("{}", json!({ "kind": kind, "detail": detail })),
        }
    }
}

impl SocketListener for PrintingListener {
    fn on_connecting(&self) {
        self.emit(style("[connecting]").dim(), "connecting", String::new());
    }

    fn on_connected(&self, event: &ConnectedEvent) {
        let who = event
            .me
            .as_ref()
            .map(|me| me.id.clone())
            .unwrap_or_else(|| "anonymous".to_string());
        self.emit(
            style("[connected]").green().bold(),
            "connected",
            format!("connection {} as {who}", event.connection_id),
        );
    }

    fn on_disconnected(&self, cause: &DisconnectCause) {
        self.emit(
            style("[disconnected]").yellow(),
            "disconnected",
            cause.to_string(),
        );
    }

    fn on_event(&self, event: &ChatEvent) {
        match self.format {
            OutputFormat::Text => {
                let label = format!("[{}]", event.event_type.as_str());
                let label = if event.event_type.is_message_event() {
                    style(label).cyan().bold()
                } else {
                    style(label).cyan()
                };
                println!("  {label} {}", serde_json::Value::Object(event.data.clone()));
            }
            OutputFormat::Json => match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("failed to serialize event: {e}"),
            },
        }
    }

    fn on_error(&self, error: &ChatError) {
        self.emit(style("[error]").red().bold(), "error", error.to_string());
    }
}

/// Build a socket manager for the configured identity.
fn build_manager(cfg: &AppConfig) -> ScResult<SocketManager> {
    let mut builder = SocketManagerBuilder::from_config(cfg);
    if !cfg.connection.user_id.is_empty() {
        if cfg.connection.token.is_empty() {
            return Err(ScError::MissingConfig(format!(
                "token for user {}",
                cfg.connection.user_id
            )));
        }
        let provider = StaticTokenProvider::new(cfg.connection.token.clone());
        builder = builder.with_token_manager(Arc::new(TokenManagerImpl::new(Arc::new(provider))));
    }
    Ok(builder.build())
}

/// Run the connect command.
pub async fn run(
    config: ConfigHandle,
    overrides: Overrides,
    save_path: Option<PathBuf>,
    format: OutputFormat,
) -> ScResult<()> {
    overrides.apply(&mut *config.write().await);
    let cfg = config.read().await.clone();

    if !cfg.is_connection_configured() {
        error!("no endpoint or api key configured. Use --endpoint/--api-key or set them in config.");
        return Err(ScError::MissingConfig("connection endpoint and api key".into()));
    }

    if let Some(path) = save_path {
        config.save_to(&path).await?;
        println!("  {} Config saved to {}", style("OK").green(), path.display());
    }

    let manager = build_manager(&cfg)?;
    manager.add_listener(Arc::new(PrintingListener { format }));

    if let OutputFormat::Text = format {
        println!(
            "{} Connecting to {} as {}... (Ctrl+C to stop)",
            style("[sc-chat]").bold().dim(),
            cfg.connection.endpoint,
            if cfg.connection.user_id.is_empty() {
                "anonymous"
            } else {
                cfg.connection.user_id.as_str()
            }
        );
    }

    if cfg.connection.user_id.is_empty() {
        manager.connect_anonymously().await;
    } else {
        let mut user = User::new(&cfg.connection.user_id);
        if !cfg.connection.user_name.is_empty() {
            user = user.with_name(&cfg.connection.user_name);
        }
        manager.connect_user(user).await;
    }

    let mut states = manager.state_receiver();
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if let ConnectionState::DisconnectedPermanently(error) = state {
                    let reason = error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "disconnected".to_string());
                    return Err(ScError::Socket(reason));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if let OutputFormat::Text = format {
                    println!("\n  Disconnecting...");
                }
                manager.disconnect().await;
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides() -> Overrides {
        Overrides {
            endpoint: None,
            api_key: None,
            user: None,
            name: None,
            token: None,
        }
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut cfg = AppConfig::default();
        cfg.connection.api_key = "from-file".into();
        Overrides {
            endpoint: Some("https://chat.example.com".into()),
            user: Some("jc".into()),
            ..overrides()
        }
        .apply(&mut cfg);

        assert_eq!(cfg.connection.endpoint, "wss://chat.example.com/");
        assert_eq!(cfg.connection.api_key, "from-file");
        assert_eq!(cfg.connection.user_id, "jc");
    }

    #[tokio::test]
    async fn test_user_connection_requires_token() {
        let mut cfg = AppConfig::default();
        cfg.connection.endpoint = "wss://chat.example.com/".into();
        cfg.connection.api_key = "key".into();
        cfg.connection.user_id = "jc".into();
        assert!(matches!(
            build_manager(&cfg),
            Err(ScError::MissingConfig(_))
        ));

        cfg.connection.token = "jwt".into();
        assert!(build_manager(&cfg).is_ok());

        cfg.connection.user_id.clear();
        cfg.connection.token.clear();
        assert!(build_manager(&cfg).is_ok());
    }
}
