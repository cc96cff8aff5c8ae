//! Engine configuration.
//!
//! [`PulseConfig`] is what the host supplies, with every field optional.
//! [`ResolvedConfig`] is the validated, defaulted snapshot the engine runs on.
//! A resolved config is never edited in place; re-initialization replaces it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default collector endpoint.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
/// Default number of pending traces that triggers a flush.
pub const DEFAULT_BATCH_SIZE: u32 = 10;
/// Default flush interval in milliseconds.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5000;
/// Required API key prefix.
pub const API_KEY_PREFIX: &str = "pulse_sk_";

const MIN_BATCH_SIZE: u32 = 1;
const MAX_BATCH_SIZE: u32 = 100;
const MIN_FLUSH_INTERVAL_MS: u64 = 1000;

/// User-supplied configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Collector API key (`pulse_sk_...`).
    pub api_key: Option<String>,
    /// Collector base URL.
    pub api_url: Option<String>,
    /// Pending trace count that triggers a flush (1-100).
    pub batch_size: Option<u32>,
    /// Background flush interval in milliseconds (>= 1000).
    pub flush_interval_ms: Option<u64>,
    /// Whether telemetry is collected at all.
    pub enabled: Option<bool>,
}

impl PulseConfig {
    /// Create a config with just an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Read configuration from `PULSE_*` environment variables.
    ///
    /// Unparseable numeric or boolean values are treated as unset.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            api_key: var("PULSE_API_KEY"),
            api_url: var("PULSE_API_URL"),
            batch_size: var("PULSE_BATCH_SIZE").and_then(|v| v.parse().ok()),
            flush_interval_ms: var("PULSE_FLUSH_INTERVAL").and_then(|v| v.parse().ok()),
            enabled: var("PULSE_ENABLED").and_then(|v| parse_bool(&v)),
        }
    }

    /// Fill unset fields from `other`.
    pub fn or(self, other: PulseConfig) -> Self {
        Self {
            api_key: self.api_key.or(other.api_key),
            api_url: self.api_url.or(other.api_url),
            batch_size: self.batch_size.or(other.batch_size),
            flush_interval_ms: self.flush_interval_ms.or(other.flush_interval_ms),
            enabled: self.enabled.or(other.enabled),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_flush_interval_ms(mut self, interval_ms: u64) -> Self {
        self.flush_interval_ms = Some(interval_ms);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Validate and apply defaults.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        ResolvedConfig::resolve(self)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validated engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub api_url: String,
    pub batch_size: u32,
    pub flush_interval: Duration,
    pub enabled: bool,
}

impl ResolvedConfig {
    /// Validate a user config. Nothing is returned unless every check passes.
    pub fn resolve(config: &PulseConfig) -> Result<Self, ConfigError> {
        // The key is checked exactly as given, without trimming.
        let api_key = match config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(ConfigError::MissingApiKey),
        };
        if !api_key.starts_with(API_KEY_PREFIX) {
            return Err(ConfigError::InvalidApiKey {
                prefix: API_KEY_PREFIX,
            });
        }

        let batch_size = config.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(ConfigError::BatchSizeOutOfRange(batch_size));
        }

        let flush_interval_ms = config
            .flush_interval_ms
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_MS);
        if flush_interval_ms < MIN_FLUSH_INTERVAL_MS {
            return Err(ConfigError::FlushIntervalTooShort(flush_interval_ms));
        }

        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        validate_endpoint(&api_url)?;

        Ok(Self {
            api_key,
            api_url,
            batch_size,
            flush_interval: Duration::from_millis(flush_interval_ms),
            enabled: config.enabled.unwrap_or(true),
        })
    }

    /// Batch threshold as a buffer length.
    pub fn batch_threshold(&self) -> usize {
        self.batch_size as usize
    }

    /// API key with everything past the prefix hidden.
    pub fn masked_api_key(&self) -> String {
        let visible: String = self
            .api_key
            .chars()
            .take(API_KEY_PREFIX.len() + 4)
            .collect();
        format!("{visible}****")
    }
}

fn validate_endpoint(url: &str) -> Result<(), ConfigError> {
    let parsed =
        reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidEndpoint(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidEndpoint(format!(
            "{url}: unsupported scheme '{other}'"
        ))),
    }
}
