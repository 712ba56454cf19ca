// src/error.rs

//! Unified error handling for the ingestion engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for whatson operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page content could not be retrieved
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// A show collided with a stored record on a unique key
    #[error("Storage conflict on {key}: {message}")]
    StorageConflict { key: String, message: String },

    /// Non-conflict storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
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

    /// Date text did not match the theatre's conventions
    #[error("Cannot parse date '{text}': {message}")]
    DateParse { text: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a date parsing error.
    pub fn date_parse(text: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::DateParse {
            text: text.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage conflict error.
    pub fn conflict(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::StorageConflict {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create a fatal storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this is an expected uniqueness violation rather than a systemic failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StorageConflict { .. })
    }
}
