// src/error.rs

//! Unified error handling for the notice watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notice page could not be fetched
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Notice page could not be turned into notice records
    #[error("Extract error: {0}")]
    Extract(String),

    /// Alert email could not be delivered
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// History could not be written
    #[error("Persist error for {path}: {message}")]
    Persist { path: String, message: String },

    /// A cycle task ended without reporting back (panicked or was cancelled)
    #[error("Cycle aborted: {0}")]
    CycleAborted(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error for the given URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error.
    pub fn extract(message: impl fmt::Display) -> Self {
        Self::Extract(message.to_string())
    }

    /// Create a dispatch error.
    pub fn dispatch(message: impl fmt::Display) -> Self {
        Self::Dispatch(message.to_string())
    }

    /// Create a persistence error for the given path.
    pub fn persist(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Persist {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error should stop the process instead of waiting for the
    /// next cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Selector { .. } | Self::CycleAborted(_)
        )
    }
}
