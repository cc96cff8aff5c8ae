//! Configuration file support for the pulse CLI.
//!
//! Settings live in a `.pulse/` directory:
//! - `.pulse/config.toml` - Collector and batching settings
//! - `.pulse/logs/` - Log files when `--log-dir` points there
//!
//! Config discovery searches for `.pulse/config.toml` starting from the current
//! directory and walking up to parent directories.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pulse_sdk::PulseConfig;
use serde::{Deserialize, Serialize};

/// The pulse data directory name.
pub const PULSE_DIR: &str = ".pulse";
/// The config file name within the pulse directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Contents of `.pulse/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where traces are sent.
    pub collector: CollectorConfig,
    /// When traces are sent.
    pub batching: BatchingConfig,
}

/// Collector settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

/// Batching settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub batch_size: Option<u32>,
    pub flush_interval_ms: Option<u64>,
    pub enabled: Option<bool>,
}

/// Default file written by `pulse init`.
pub const DEFAULT_CONFIG: &str = r#"# Pulse configuration
# Environment variables (PULSE_API_KEY, PULSE_API_URL, ...) override these values.

[collector]
api_url = "http://localhost:3000"
# api_key = "pulse_sk_..."

[batching]
batch_size = 10          # Flush once this many traces are pending (1-100)
flush_interval_ms = 5000 # Background flush interval (>= 1000)
enabled = true
"#;

impl Config {
    /// Load configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Find and load configuration from current or parent directories.
    pub fn find_and_load() -> Result<Option<(Self, PathBuf)>> {
        let current = std::env::current_dir()?;
        Self::find_and_load_from(&current)
    }

    /// Find and load configuration starting from a specific directory.
    ///
    /// Looks for `.pulse/config.toml` in the directory and its parents and
    /// returns the config with the `.pulse` directory it was found in.
    pub fn find_and_load_from(start: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start.to_path_buf();

        loop {
            let pulse_dir = dir.join(PULSE_DIR);
            let config_path = pulse_dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::from_file(&config_path)?;
                return Ok(Some((config, pulse_dir)));
            }

            if !dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// File settings as an engine config, with unset fields left unset.
    pub fn to_pulse_config(&self) -> PulseConfig {
        PulseConfig {
            api_key: self.collector.api_key.clone(),
            api_url: self.collector.api_url.clone(),
            batch_size: self.batching.batch_size,
            flush_interval_ms: self.batching.flush_interval_ms,
            enabled: self.batching.enabled,
        }
    }
}

/// Layer configuration sources: flags over environment over file.
///
/// Anything still unset falls back to the engine defaults at resolve time.
pub fn layered(flags: PulseConfig, env: PulseConfig, file: &Config) -> PulseConfig {
    flags.or(env).or(file.to_pulse_config())
}
