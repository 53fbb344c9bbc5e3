//! Error types for ContentIQ.
//!
//! Library crates use [`ContentIqError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ContentIQ operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentIqError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to an external backend.
    #[error("network error: {0}")]
    Network(String),

    /// Scraping backend rejected a URL or returned an unusable payload.
    #[error("scrape error: {0}")]
    Scrape(String),

    /// LLM or embedding backend error (API failure, unusable response).
    #[error("backend error: {0}")]
    Backend(String),

    /// Knowledge store error (index load/save, store not usable).
    #[error("store error: {0}")]
    Store(String),

    /// Failed to parse structured text (LLM output, JSON content files).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (missing entity, empty batch, invalid shape).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentIqError>;

impl ContentIqError {
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
}
