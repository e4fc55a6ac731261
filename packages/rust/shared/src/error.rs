//! Error types for magedocs.
//!
//! Library crates use [`DocsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all magedocs operations.
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Malformed upstream payload (e.g. an unreadable GitHub tree listing).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Rejected caller input (short query, unknown source, bad limit).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// MCP transport or handshake failure.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsError>;

impl DocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

    /// Whether a retry could plausibly succeed (transport failures and 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocsError::config("missing db path");
        assert_eq!(err.to_string(), "config error: missing db path");

        let err = DocsError::HttpStatus {
            url: "https://docs.hyva.io/x".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 for https://docs.hyva.io/x");

        let err = DocsError::NotFound("document 42".into());
        assert!(err.to_string().contains("document 42"));
    }

    #[test]
    fn transient_classification() {
        assert!(DocsError::Network("timeout".into()).is_transient());
        assert!(
            DocsError::HttpStatus {
                url: String::new(),
                status: 503
            }
            .is_transient()
        );
        assert!(
            !DocsError::HttpStatus {
                url: String::new(),
                status: 404
            }
            .is_transient()
        );
        assert!(!DocsError::validation("short query").is_transient());
    }
}
