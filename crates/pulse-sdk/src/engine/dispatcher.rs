//! Batch dispatch.
//!
//! Hands a drained batch to the sink exactly once and keeps any failure from
//! escaping: a failed batch is logged, counted, and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pulse_tracing::TraceRecord;

use crate::error::DeliveryError;
use crate::sink::SharedSink;

/// Delivery counters since the dispatcher was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub batches_delivered: u64,
    pub records_delivered: u64,
    pub batches_failed: u64,
    pub records_dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    batches_delivered: AtomicU64,
    records_delivered: AtomicU64,
    batches_failed: AtomicU64,
    records_dropped: AtomicU64,
}

/// Best-effort delivery of batches to a sink.
#[derive(Clone)]
pub struct Dispatcher {
    sink: SharedSink,
    counters: Arc<Counters>,
}

impl Dispatcher {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Deliver a batch.
    ///
    /// An empty batch returns immediately without touching the sink. The
    /// returned error is informational only; the batch is gone either way.
    pub async fn deliver(&self, batch: Vec<TraceRecord>) -> Result<usize, DeliveryError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.len();
        match self.sink.deliver(&batch).await {
            Ok(()) => {
                self.counters
                    .batches_delivered
                    .fetch_add(1, Ordering::Relaxed);
                self.counters
                    .records_delivered
                    .fetch_add(count as u64, Ordering::Relaxed);
                tracing::debug!(sink = self.sink.name(), records = count, "Delivered traces");
                Ok(count)
            }
            Err(e) => {
                self.counters.batches_failed.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .records_dropped
                    .fetch_add(count as u64, Ordering::Relaxed);
                tracing::warn!(
                    sink = self.sink.name(),
                    dropped = count,
                    error = %e,
                    "Failed to send traces"
                );
                Err(e)
            }
        }
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            batches_delivered: self.counters.batches_delivered.load(Ordering::Relaxed),
            records_delivered: self.counters.records_delivered.load(Ordering::Relaxed),
            batches_failed: self.counters.batches_failed.load(Ordering::Relaxed),
            records_dropped: self.counters.records_dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("sink", &self.sink.name())
            .field("stats", &self.stats())
            .finish()
    }
}
