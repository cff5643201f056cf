//! Error types for the taskboard client.
//!
//! # Design
//! Callers only ever see one thing about a failure: a human-readable message.
//! `Display` on [`ApiError`] yields exactly that message. For a server
//! rejection it is the `error` string the server put in the body; for
//! everything else (no response, undecodable body, unencodable payload) it is
//! [`FALLBACK_MESSAGE`]. The underlying detail stays reachable through
//! [`ApiError::detail`] for logging but is never part of the message.

/// Message used whenever the server did not supply one.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// Errors returned by `TaskboardClient` parsers and by `Transport`s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// No response was received.
    #[error("{}", FALLBACK_MESSAGE)]
    Transport(String),

    /// The response body could not be decoded into the expected type.
    #[error("{}", FALLBACK_MESSAGE)]
    Decode(String),

    /// The request payload could not be encoded as JSON.
    #[error("{}", FALLBACK_MESSAGE)]
    Encode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 401, which the startup session check treats as "no session".
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Diagnostic detail, for logs only.
    pub fn detail(&self) -> &str {
        match self {
            ApiError::Server { message, .. } => message,
            ApiError::Transport(detail) | ApiError::Decode(detail) | ApiError::Encode(detail) => {
                detail
            }
        }
    }
}

/// Errors raised while reading client configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },

    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}
