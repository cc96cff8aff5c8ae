//! In-memory sink for testing.
//!
//! Captures every batch it is handed and can be switched into failure mode or
//! given artificial latency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pulse_tracing::TraceRecord;

use crate::error::DeliveryError;
use crate::sink::TraceSink;

/// A capturing mock sink.
///
/// # Example
///
/// ```ignore
/// use pulse_sdk::testing::MockSink;
///
/// let sink = Arc::new(MockSink::new());
/// let engine = EngineHandle::with_sink(sink.clone());
/// // ... record traces ...
/// assert_eq!(sink.batch_sizes(), vec![10]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    /// Batches delivered (or attempted), in call order.
    batches: Arc<Mutex<Vec<Vec<TraceRecord>>>>,
    /// When set, every delivery fails after being captured.
    fail: Arc<AtomicBool>,
    /// Simulated delivery latency.
    latency: Option<Duration>,
}

impl MockSink {
    /// Create a sink that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that rejects every batch.
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.set_failing(true);
        sink
    }

    /// Set simulated latency for deliveries.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Switch failure mode on or off.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All batches handed to the sink.
    pub fn batches(&self) -> Vec<Vec<TraceRecord>> {
        self.batches.lock().unwrap().clone()
    }

    /// Size of each batch, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    /// Every record handed to the sink, flattened in call order.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    /// Number of deliver calls.
    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl TraceSink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, batch: &[TraceRecord]) -> Result<(), DeliveryError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.batches.lock().unwrap().push(batch.to_vec());

        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected {
                status: 500,
                body: "MockSink: failure mode".to_string(),
            });
        }
        Ok(())
    }
}
