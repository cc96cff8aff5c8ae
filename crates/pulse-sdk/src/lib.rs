//! pulse-sdk: client-side LLM telemetry engine
//!
//! This crate collects trace records for calls made to LLM providers and ships
//! them to the pulse collector without ever getting in the caller's way:
//! - Buffering of finished traces behind a single short-lived lock
//! - Threshold flushes on the producing call and timer flushes on a worker task
//! - Best-effort delivery: failures are logged and the batch is dropped
//! - An `Observer` that wraps provider calls and records their outcome
//!
//! # Usage
//!
//! ```rust,no_run
//! use pulse_sdk::{EngineHandle, Observer, PulseConfig};
//! use pulse_tracing::Provider;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = EngineHandle::new();
//! engine.init(&PulseConfig::new("pulse_sk_live_123")).await?;
//!
//! let observer = Observer::new(engine.clone(), Provider::OpenAi);
//! let request = json!({"model": "gpt-4o-mini", "messages": []});
//! let _response = observer
//!     .call(request.as_object().cloned().unwrap_or_default(), |_req| async move {
//!         // Call the provider with the cleaned request here.
//!         Ok::<_, std::io::Error>(json!({"model": "gpt-4o-mini", "choices": []}))
//!     })
//!     .await?;
//!
//! engine.flush_now().await;
//! engine.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod observe;
pub mod sink;
pub mod transport;

// Testing utilities - available in test builds and behind the `testing` feature
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{
    API_KEY_PREFIX, DEFAULT_API_URL, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL_MS, PulseConfig,
    ResolvedConfig,
};
pub use engine::{DispatchStats, Dispatcher, EngineHandle, FlushWorker, TraceBuffer};
pub use error::{ConfigError, DeliveryError};
pub use normalize::{Normalize, normalize_anthropic, normalize_openai};
pub use observe::{ObserveOptions, Observer};
pub use sink::{SharedSink, TraceSink};
pub use transport::{HttpSink, TRACES_PATH};
