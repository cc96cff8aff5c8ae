//! pulse: command-line companion for the pulse telemetry SDK
//!
//! Validates collector configuration, scaffolds a `.pulse/config.toml`, and
//! replays captured trace files through the same engine the SDK embeds.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulse_sdk::{DispatchStats, EngineHandle, PulseConfig, ResolvedConfig};
use pulse_tracing::TraceRecord;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::Config;

/// Command-line companion for the pulse telemetry SDK
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to .pulse directory or config file (default: search for .pulse/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to daily-rotated files in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Collector API key (overrides PULSE_API_KEY and the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Collector base URL (overrides PULSE_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Pending trace count that triggers a flush
    #[arg(long, global = true)]
    batch_size: Option<u32>,

    /// Background flush interval in milliseconds
    #[arg(long, global = true)]
    flush_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and print the resolved settings
    Check,

    /// Initialize a new .pulse directory with config file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Send traces captured in a JSONL file to the collector
    Replay {
        /// File with one trace record per line
        file: PathBuf,
    },
}

impl Cli {
    fn flag_config(&self) -> PulseConfig {
        PulseConfig {
            api_key: self.api_key.clone(),
            api_url: self.api_url.clone(),
            batch_size: self.batch_size,
            flush_interval_ms: self.flush_interval_ms,
            enabled: None,
        }
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize logging to stderr.
fn init_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(verbose))
        .init();
}

/// Initialize logging to rotating files in `log_dir` with daily rotation.
fn init_file_logging(log_dir: &Path, verbose: bool) {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
        init_logging(verbose);
        return;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "pulse.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard stops the writer thread.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(env_filter(verbose))
        .init();
}

/// Load configuration from file.
///
/// Returns the config and the `.pulse` directory it came from, if any.
fn load_config(override_path: Option<&PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = override_path {
        // Explicit path override - either the .pulse directory or the file itself
        let config_file = if path.is_dir() {
            path.join(config::CONFIG_FILE)
        } else {
            path.clone()
        };
        let pulse_dir = config_file.parent().unwrap_or(path).to_path_buf();

        let config = Config::from_file(&config_file)?;
        info!("Loaded config from {}", config_file.display());
        return Ok((config, Some(pulse_dir)));
    }

    match Config::find_and_load() {
        Ok(Some((config, pulse_dir))) => {
            info!("Found config at {}", pulse_dir.display());
            Ok((config, Some(pulse_dir)))
        }
        Ok(None) => {
            tracing::debug!("No .pulse/config.toml found, using defaults");
            Ok((Config::default(), None))
        }
        Err(e) => {
            tracing::warn!("Error searching for config: {}, using defaults", e);
            Ok((Config::default(), None))
        }
    }
}

fn print_resolved(resolved: &ResolvedConfig, source: Option<&Path>) {
    println!("Pulse configuration OK");
    match source {
        Some(dir) => println!("  Config dir:     {}", dir.display()),
        None => println!("  Config dir:     (none, using env and defaults)"),
    }
    println!("  API URL:        {}", resolved.api_url);
    println!("  API key:        {}", resolved.masked_api_key());
    println!("  Batch size:     {}", resolved.batch_size);
    println!(
        "  Flush interval: {}ms",
        resolved.flush_interval.as_millis()
    );
    println!("  Enabled:        {}", resolved.enabled);
}

/// Push `records` through `engine`, flush what is left, and stop it.
///
/// Returns the delivery counters observed before stopping.
async fn replay(engine: &EngineHandle, records: Vec<TraceRecord>) -> DispatchStats {
    for record in records {
        engine.record(record).await;
    }
    engine.flush_now().await;
    let stats = engine.stats();
    engine.stop().await;
    stats
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.log_dir {
        Some(dir) => init_file_logging(dir, cli.verbose),
        None => init_logging(cli.verbose),
    }

    match &cli.command {
        Commands::Init { force } => {
            use config::{CONFIG_FILE, DEFAULT_CONFIG, PULSE_DIR};

            let pulse_dir = PathBuf::from(PULSE_DIR);
            let config_path = pulse_dir.join(CONFIG_FILE);

            if config_path.exists() && !force {
                anyhow::bail!(".pulse/config.toml already exists. Use --force to overwrite.");
            }

            if !pulse_dir.exists() {
                std::fs::create_dir_all(&pulse_dir)?;
                info!("Created {}/", pulse_dir.display());
            }

            std::fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            println!("Created {}", config_path.display());
            println!("Set api_key in the file or export PULSE_API_KEY before running pulse.");
        }

        Commands::Check => {
            let (file, pulse_dir) = load_config(cli.config.as_ref())?;
            let merged = config::layered(cli.flag_config(), PulseConfig::from_env(), &file);
            let resolved = merged.resolve().context("Invalid pulse configuration")?;
            print_resolved(&resolved, pulse_dir.as_deref());
        }

        Commands::Replay { file } => {
            let (file_config, _) = load_config(cli.config.as_ref())?;
            let merged =
                config::layered(cli.flag_config(), PulseConfig::from_env(), &file_config);

            let records = pulse_tracing::read_traces(file)
                .with_context(|| format!("Failed to read traces from {}", file.display()))?;
            info!(count = records.len(), "Loaded traces from {}", file.display());

            let engine = EngineHandle::new();
            let resolved = engine
                .init(&merged)
                .await
                .context("Invalid pulse configuration")?;
            if !resolved.enabled {
                println!("Telemetry is disabled; nothing was sent.");
                return Ok(());
            }

            let total = records.len();
            let stats = replay(&engine, records).await;

            println!("Replayed {} traces to {}", total, resolved.api_url);
            println!(
                "  Delivered: {} records in {} batches",
                stats.records_delivered, stats.batches_delivered
            );
            if stats.batches_failed > 0 {
                println!(
                    "  Dropped:   {} records in {} failed batches",
                    stats.records_dropped, stats.batches_failed
                );
            }
        }
    }

    Ok(())
}
