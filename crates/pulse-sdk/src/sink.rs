//! Delivery sink abstraction.
//!
//! A sink ships one batch of trace records somewhere and reports whether that
//! worked. Sinks do not retry; the dispatcher decides what a failure means.

use std::sync::Arc;

use async_trait::async_trait;
use pulse_tracing::TraceRecord;

use crate::error::DeliveryError;

/// Destination for batches of trace records.
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Deliver one batch. Called at most once per drained batch.
    async fn deliver(&self, batch: &[TraceRecord]) -> Result<(), DeliveryError>;
}

/// Shared, dynamically dispatched sink.
pub type SharedSink = Arc<dyn TraceSink>;

