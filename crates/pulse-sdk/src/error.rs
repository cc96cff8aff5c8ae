//! Error types for the telemetry engine.
//!
//! Only [`ConfigError`] ever reaches the host: it is returned from
//! initialization. [`DeliveryError`] is produced by sinks and absorbed by the
//! dispatcher.

use thiserror::Error;

/// Invalid user-supplied configuration. Fatal to initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No API key was supplied.
    #[error("api_key is required")]
    MissingApiKey,

    /// API key does not carry the expected prefix.
    #[error("api_key must start with '{prefix}'")]
    InvalidApiKey { prefix: &'static str },

    /// Batch size outside 1..=100.
    #[error("batch_size must be between 1 and 100 (got {0})")]
    BatchSizeOutOfRange(u32),

    /// Flush interval below the 1000ms floor.
    #[error("flush_interval must be at least 1000ms (got {0}ms)")]
    FlushIntervalTooShort(u64),

    /// Endpoint is not an http(s) URL.
    #[error("invalid api_url: {0}")]
    InvalidEndpoint(String),

    /// The HTTP client for the collector could not be created.
    #[error("failed to create HTTP client: {0}")]
    Transport(String),
}

/// A batch could not be delivered to the collector.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The collector answered with a non-success status.
    #[error("failed to send traces ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The batch could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for DeliveryError {
    fn from(e: serde_json::Error) -> Self {
        DeliveryError::Serialization(e.to_string())
    }
}
