//! Error types for hcsleep.
//!
//! Fatal errors bubble to the request boundary as a single `HubError`;
//! malformed individual stage intervals are skipped during aggregation and
//! never surface here.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HubError>;

#[derive(Error, Debug)]
pub enum HubError {
    /// Required credential or configuration is missing. Fatal at startup,
    /// never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Login failed or the gateway returned no token. Fatal for the current
    /// aggregation call.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The session query failed after the single permitted auth retry.
    #[error("gateway request failed: {endpoint} returned {status} - {message}")]
    Gateway {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed gateway payload.
    #[error("failed to parse response from {endpoint}: {message}")]
    Parse { endpoint: String, message: String },

    /// Caller-supplied argument was unusable (zero-day window, empty date set).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
