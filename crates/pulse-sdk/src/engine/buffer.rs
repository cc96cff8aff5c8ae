//! Pending trace buffer.
//!
//! A FIFO of records guarded by one mutex. The lock is only ever held for a
//! push or a swap, never across an await.

use std::mem;
use std::sync::{Mutex, MutexGuard};

use pulse_tracing::TraceRecord;

/// Ordered collection of records waiting to be delivered.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    records: Mutex<Vec<TraceRecord>>,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceRecord>> {
        // The vector is plain data, so a panic elsewhere cannot leave it torn.
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a record.
    ///
    /// Returns `true` when the pending count has reached `threshold` and the
    /// caller should flush. A zero threshold never signals.
    pub fn append(&self, record: TraceRecord, threshold: usize) -> bool {
        let len = {
            let mut records = self.lock();
            records.push(record);
            records.len()
        };
        threshold > 0 && len >= threshold
    }

    /// Take every pending record, leaving the buffer empty.
    ///
    /// Records appended after the swap land in the fresh buffer and are not
    /// part of the returned batch.
    pub fn drain_all(&self) -> Vec<TraceRecord> {
        mem::take(&mut *self.lock())
    }

    /// Drop every pending record. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        let dropped = self.drain_all();
        dropped.len()
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
