//! Telemetry engine lifecycle.
//!
//! [`EngineHandle`] owns everything the engine needs at runtime: the resolved
//! config, the pending-trace buffer, the dispatcher, and the background flush
//! worker. Producers hand it finished records; it decides when to ship them.
//!
//! Records reach the sink through two paths:
//!
//! - **Threshold flush**: the `record` call that brings the buffer to the batch
//!   size drains and delivers inline, so that caller pays the delivery latency.
//! - **Timer flush**: the worker drains and delivers once per flush interval.
//!
//! Delivery failures are logged and counted, never returned to producers.

mod buffer;
mod dispatcher;
mod worker;


pub use buffer::TraceBuffer;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use worker::{FlushWorker, STOP_JOIN_TIMEOUT};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use pulse_tracing::{TraceInput, TraceRecord};
use tokio::sync::Mutex;

use crate::config::{PulseConfig, ResolvedConfig};
use crate::error::ConfigError;
use crate::sink::SharedSink;
use crate::transport::HttpSink;

/// What caused a flush; used for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushTrigger {
    Threshold,
    Timer,
    Manual,
}

/// Config and dispatcher committed together by `initialize`.
#[derive(Debug)]
struct EngineState {
    config: ResolvedConfig,
    dispatcher: Dispatcher,
}

/// State shared between handles and the flush worker.
struct EngineCore {
    sink: Option<SharedSink>,
    state: RwLock<Option<Arc<EngineState>>>,
    enabled: AtomicBool,
    buffer: TraceBuffer,
}

impl EngineCore {
    fn state(&self) -> Option<Arc<EngineState>> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Drain the buffer and deliver it. Returns the number of records the sink
    /// accepted.
    async fn flush(&self, trigger: FlushTrigger) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let Some(state) = self.state() else {
            return 0;
        };

        let batch = self.buffer.drain_all();
        if batch.is_empty() {
            return 0;
        }

        tracing::debug!(?trigger, records = batch.len(), "Flushing traces");
        state.dispatcher.deliver(batch).await.unwrap_or(0)
    }
}

/// Handle to one telemetry engine.
///
/// Cheap to clone; clones share the same buffer, config, and worker. Dropping
/// the last handle cancels the flush worker.
#[derive(Clone)]
pub struct EngineHandle {
    core: Arc<EngineCore>,
    worker: Arc<Mutex<Option<FlushWorker>>>,
}

impl EngineHandle {
    /// Create an engine that delivers to the collector over HTTP once
    /// initialized.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an engine that always delivers to `sink`, whatever endpoint the
    /// config names.
    pub fn with_sink(sink: SharedSink) -> Self {
        Self::build(Some(sink))
    }

    fn build(sink: Option<SharedSink>) -> Self {
        Self {
            core: Arc::new(EngineCore {
                sink,
                state: RwLock::new(None),
                enabled: AtomicBool::new(false),
                buffer: TraceBuffer::new(),
            }),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    /// Validate `config` and make it the engine's configuration.
    ///
    /// Either everything is replaced or, on error, nothing is: the previous
    /// config, dispatcher, and enabled flag stay as they were.
    pub fn initialize(&self, config: &PulseConfig) -> Result<ResolvedConfig, ConfigError> {
        let resolved = ResolvedConfig::resolve(config)?;
        let sink: SharedSink = match &self.core.sink {
            Some(sink) => Arc::clone(sink),
            None => Arc::new(HttpSink::from_config(&resolved)?),
        };
        let state = Arc::new(EngineState {
            config: resolved.clone(),
            dispatcher: Dispatcher::new(sink),
        });

        *self
            .core
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(state);
        self.core.enabled.store(resolved.enabled, Ordering::Release);

        tracing::info!(
            api_url = %resolved.api_url,
            batch_size = resolved.batch_size,
            flush_interval_ms = resolved.flush_interval.as_millis() as u64,
            enabled = resolved.enabled,
            "Pulse telemetry initialized"
        );
        Ok(resolved)
    }

    /// Initialize and start the flush worker.
    pub async fn init(&self, config: &PulseConfig) -> Result<ResolvedConfig, ConfigError> {
        let resolved = self.initialize(config)?;
        self.start().await;
        Ok(resolved)
    }

    /// Start the background flush worker, replacing any running one.
    ///
    /// Does nothing while the engine is disabled or uninitialized.
    pub async fn start(&self) {
        if !self.core.is_enabled() {
            return;
        }
        let Some(state) = self.core.state() else {
            return;
        };

        let mut slot = self.worker.lock().await;
        if let Some(previous) = slot.take() {
            previous.stop().await;
        }

        let core = Arc::clone(&self.core);
        *slot = Some(FlushWorker::spawn(state.config.flush_interval, move || {
            let core = Arc::clone(&core);
            async move {
                core.flush(FlushTrigger::Timer).await;
            }
        }));
    }

    /// Stop the flush worker and discard pending records without delivering
    /// them. Safe to call repeatedly and before `start`.
    pub async fn stop(&self) {
        let mut slot = self.worker.lock().await;
        if let Some(worker) = slot.take() {
            worker.stop().await;
        }

        let dropped = self.core.buffer.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "Discarded undelivered traces on stop");
        }
    }

    /// Whether producers should record at all.
    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    /// Turn collection on or off without touching the config or worker.
    ///
    /// Enabling an uninitialized engine has no effect.
    pub fn set_enabled(&self, enabled: bool) {
        let enabled = enabled && self.core.state().is_some();
        self.core.enabled.store(enabled, Ordering::Release);
    }

    /// Whether a flush worker is currently running.
    pub async fn is_running(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|w| !w.is_finished())
    }

    /// Add a finished record to the buffer, flushing inline if the batch size
    /// has been reached.
    pub async fn record(&self, record: TraceRecord) {
        if !self.core.is_enabled() {
            return;
        }
        let Some(state) = self.core.state() else {
            return;
        };

        if self
            .core
            .buffer
            .append(record, state.config.batch_threshold())
        {
            self.core.flush(FlushTrigger::Threshold).await;
        }
    }

    /// Build and record a trace, skipping construction entirely when disabled.
    pub async fn record_if_enabled(&self, input: TraceInput) {
        if !self.core.is_enabled() {
            return;
        }
        self.record(input.build()).await;
    }

    /// Drain and deliver whatever is pending right now.
    ///
    /// Returns how many records the sink accepted; a failed delivery counts as
    /// zero and its records are dropped.
    pub async fn flush_now(&self) -> usize {
        self.core.flush(FlushTrigger::Manual).await
    }

    /// Number of records waiting for delivery.
    pub fn pending(&self) -> usize {
        self.core.buffer.len()
    }

    /// Current resolved config, if initialized.
    pub fn config(&self) -> Option<ResolvedConfig> {
        self.core.state().map(|s| s.config.clone())
    }

    /// Delivery counters for the current configuration.
    pub fn stats(&self) -> DispatchStats {
        self.core
            .state()
            .map(|s| s.dispatcher.stats())
            .unwrap_or_default()
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("enabled", &self.is_enabled())
            .field("pending", &self.pending())
            .field("state", &self.core.state())
            .finish()
    }
}
