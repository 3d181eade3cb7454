//! Error types for Paperdesk.
//!
//! Library crates use [`PaperdeskError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Paperdesk operations.
#[derive(Debug, thiserror::Error)]
pub enum PaperdeskError {
    /// Local precondition failure; no external call was made.
    #[error("{message}")]
    Validation { message: String },

    /// The remote service was unreachable or the exchange broke down.
    #[error("network error: {0}")]
    Transport(String),

    /// Structured failure message returned by a remote capability.
    #[error("{message}")]
    Service {
        status: Option<u16>,
        message: String,
    },

    /// Locally invalid request shape (e.g. an empty search query).
    #[error("{message}")]
    State { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PaperdeskError>;

impl PaperdeskError {
    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a state error from any displayable message.
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State {
            message: msg.into(),
        }
    }

    /// Create a service error, optionally tagged with the HTTP status.
    pub fn service(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The single human-readable message stored in a component's error slot.
    ///
    /// Messages that came from the user's own input or from the server are
    /// surfaced as-is; transport and local plumbing failures use `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation { message }
            | Self::State { message }
            | Self::Service { message, .. }
            | Self::Config { message } => message.clone(),
            Self::Transport(_) | Self::Io { .. } => fallback.to_string(),
        }
    }

    /// True for failures detected locally before any external call.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::State { .. })
    }
}
