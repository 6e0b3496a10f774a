//! Error types for docground.
//!
//! Library crates use [`DocgroundError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics, and the HTTP
//! layer maps each variant onto a status code.

use std::path::PathBuf;

/// Top-level error type for all docground operations.
#[derive(Debug, thiserror::Error)]
pub enum DocgroundError {
    /// Configuration loading error or a missing secret.
    #[error("config error: {message}")]
    Config { message: String },

    /// Request input rejected before any I/O happened.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The document store failed (transport fault, non-2xx, bad payload).
    #[error("document store error: {0}")]
    DocumentStore(String),

    /// The language model failed (transport fault, non-2xx, empty answer).
    #[error("model error: {0}")]
    Model(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocgroundError>;

impl DocgroundError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// True for input that was rejected before any collaborator was called.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// True when the document store or the language model failed.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(self, Self::DocumentStore(_) | Self::Model(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocgroundError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = DocgroundError::validation("query is required");
        assert_eq!(err.to_string(), "validation error: query is required");

        let err = DocgroundError::DocumentStore("HTTP 404".into());
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn error_classification() {
        assert!(DocgroundError::validation("bad").is_validation());
        assert!(!DocgroundError::validation("bad").is_collaborator_failure());
        assert!(DocgroundError::DocumentStore("x".into()).is_collaborator_failure());
        assert!(DocgroundError::Model("x".into()).is_collaborator_failure());
        assert!(!DocgroundError::config("x").is_collaborator_failure());
    }
}
