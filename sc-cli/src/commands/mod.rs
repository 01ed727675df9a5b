//! CLI command implementations.

pub mod config;
pub mod connect;

/// Mask a secret for display, keeping a short prefix.
pub fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}********")
}
