//! Error types for the Stream Chat socket layer.
//!
//! Two families live here:
//! - `ScError`, the `Result` error for setup-time failures (config, IO, logging).
//! - `ChatError` and `ChatErrorCode`, the value-typed errors the socket reports
//!   to listeners. These never propagate as `Err`; they are observed through
//!   listener callbacks and connection state.

use std::fmt;

use thiserror::Error;

/// Convenience type alias for Results using ScError.
pub type ScResult<T> = Result<T, ScError>;

/// Setup-time error covering configuration, IO and logging.
#[derive(Error, Debug)]
pub enum ScError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Network errors --
    /// WebSocket transport could not be set up.
    #[error("socket error: {0}")]
    Socket(String),

    /// Authentication token could not be obtained.
    #[error("token error: {0}")]
    Token(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Logging subscriber could not be installed.
    #[error("logging error: {0}")]
    Logging(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for ScError {
    fn from(e: serde_json::Error) -> Self {
        ScError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for ScError {
    fn from(e: toml::de::Error) -> Self {
        ScError::Config(e.to_string())
    }
}

/// Error codes shared by the server and the client socket.
///
/// Codes below 1000 come from the server's `error.code` field; codes from
/// 1000 upwards are raised locally by the socket layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(i32)]
pub enum ChatErrorCode {
    /// The network request failed; see the cause.
    NetworkFailed = 1000,
    /// The server error body could not be parsed.
    ParserError = 1001,
    /// The server closed the connection.
    SocketClosed = 1002,
    /// The transport failed.
    SocketFailure = 1003,
    /// The first frame was not a connection event.
    CantParseConnectionEvent = 1004,
    /// An event frame could not be decoded.
    CantParseEvent = 1005,
    /// The token is invalid.
    InvalidToken = 1006,
    /// No token was defined for a user connection.
    UndefinedToken = 1007,
    /// The socket frame was empty or not JSON.
    UnableToParseSocketEvent = 1008,
    /// The server sent no error body.
    NoErrorBody = 1009,
    /// The API key does not exist.
    ApiKeyNotFound = 2,
    /// Request validation failed.
    ValidationError = 4,
    /// Unauthenticated.
    AuthenticationError = 5,
    /// The token expired and must be refreshed.
    TokenExpired = 40,
    /// The token is not valid yet.
    TokenNotValid = 41,
    /// The token issued-at date is in the future.
    TokenDateIncorrect = 42,
    /// The token signature does not match.
    TokenSignatureIncorrect = 43,
}

impl ChatErrorCode {
    /// Every known code, in declaration order.
    pub const ALL: &'static [ChatErrorCode] = &[
        Self::NetworkFailed,
        Self::ParserError,
        Self::SocketClosed,
        Self::SocketFailure,
        Self::CantParseConnectionEvent,
        Self::CantParseEvent,
        Self::InvalidToken,
        Self::UndefinedToken,
        Self::UnableToParseSocketEvent,
        Self::NoErrorBody,
        Self::ApiKeyNotFound,
        Self::ValidationError,
        Self::AuthenticationError,
        Self::TokenExpired,
        Self::TokenNotValid,
        Self::TokenDateIncorrect,
        Self::TokenSignatureIncorrect,
    ];

    /// Convert an integer code to a known variant.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Get the integer code for this error.
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Human-readable description used as the default error message.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkFailed => "Response is failed. See cause",
            Self::ParserError => "Unable to parse error",
            Self::SocketClosed => "Server closed connection",
            Self::SocketFailure => "See stack trace in logs. Intercept error in error handler of connect",
            Self::CantParseConnectionEvent => "Unable to parse connection event",
            Self::CantParseEvent => "Unable to parse event",
            Self::InvalidToken => "Invalid token",
            Self::UndefinedToken => "No defined token. Check if connect was called and finished",
            Self::UnableToParseSocketEvent => "Socket event payload either invalid or null",
            Self::NoErrorBody => "No error body. See http status code",
            Self::ApiKeyNotFound => "Api key is not found, verify it if it's correct or was created",
            Self::ValidationError => "Validation error, check your credentials",
            Self::AuthenticationError => "Unauthenticated, problem with authentication",
            Self::TokenExpired => "Token expired, new one must be requested",
            Self::TokenNotValid => "Token not valid, new one must be requested",
            Self::TokenDateIncorrect => "Token date incorrect, new one must be requested",
            Self::TokenSignatureIncorrect => "Token signature incorrect, new one must be requested",
        }
    }

    /// Whether a raw code means the cached token can no longer be used.
    pub fn is_authentication_error(code: i32) -> bool {
        matches!(
            Self::from_code(code),
            Some(
                Self::AuthenticationError
                    | Self::InvalidToken
                    | Self::UndefinedToken
                    | Self::TokenExpired
                    | Self::TokenNotValid
                    | Self::TokenDateIncorrect
                    | Self::TokenSignatureIncorrect
            )
        )
    }
}

/// An error reported by the socket to its listeners.
///
/// Network errors carry a `stream_code`; the socket classifies those to
/// decide whether to retry, disconnect temporarily or give up. Errors
/// without a code are informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub message: String,
    pub stream_code: Option<i32>,
    pub status_code: Option<u16>,
    pub cause: Option<String>,
}

impl ChatError {
    /// A plain error without a stream code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stream_code: None,
            status_code: None,
            cause: None,
        }
    }

    /// A locally raised network error.
    pub fn network(code: ChatErrorCode) -> Self {
        Self {
            message: code.description().to_string(),
            stream_code: Some(code.code()),
            status_code: None,
            cause: None,
        }
    }

    /// A locally raised network error with an underlying cause.
    pub fn network_with_cause(code: ChatErrorCode, cause: impl fmt::Display) -> Self {
        Self {
            cause: Some(cause.to_string()),
            ..Self::network(code)
        }
    }

    /// An error decoded from a server `error` frame.
    pub fn from_server(code: i32, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            stream_code: Some(code),
            status_code,
            cause: None,
        }
    }

    /// Whether the error carries a stream code.
    pub fn is_network_error(&self) -> bool {
        self.stream_code.is_some()
    }

    /// The known code, if any.
    pub fn code(&self) -> Option<ChatErrorCode> {
        self.stream_code.and_then(ChatErrorCode::from_code)
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = self.stream_code {
            write!(f, " (code {code}")?;
            if let Some(status) = self.status_code {
                write!(f, ", status {status}")?;
            }
            write!(f, ")")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ChatError {}
