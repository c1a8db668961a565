//! Error types for Healthchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Healthchat operations
///
/// Covers configuration loading, model client calls, and session storage.
/// Failures inside the session manager are absorbed (logged or turned into
/// an in-conversation message); these variants surface only at the edges.
#[derive(Error, Debug)]
pub enum HealthchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model provider errors (API calls, bad responses, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// The fragment stream failed part way through a response
    #[error("Response stream interrupted: {0}")]
    StreamInterrupted(String),

    /// Chat history storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A session id or prefix did not identify exactly one session
    #[error("Session lookup failed: {0}")]
    SessionLookup(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Healthchat operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`HealthchatError`].
pub type Result<T> = anyhow::Result<T>;
