//! Stream Chat Core - Foundation types shared by the socket and CLI crates.
//!
//! This crate provides:
//! - Application configuration (endpoint, credentials, reconnect and health tuning)
//! - Error types and the server/client error code table
//! - Structured logging with tracing
//! - Platform data directory lookup
//! - Common constants

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod platform;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{ChatError, ChatErrorCode, ScError, ScResult};
pub use logging::init_logging;
pub use platform::Platform;
