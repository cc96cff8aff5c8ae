//! Background flush worker.
//!
//! One tokio task that sleeps for the flush interval and then runs a flush
//! cycle, until cancelled. Cancellation interrupts the sleep immediately; a
//! cycle that is already running is allowed to finish.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long `stop` waits for the task to exit before detaching it.
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to a running flush loop.
#[derive(Debug)]
pub struct FlushWorker {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl FlushWorker {
    /// Spawn the loop on the current runtime.
    ///
    /// `flush` is awaited once per wake-up, never concurrently with itself.
    pub fn spawn<F, Fut>(interval: Duration, mut flush: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            tracing::debug!(interval_ms = interval.as_millis() as u64, "Flush worker started");
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                flush().await;
            }
            tracing::debug!("Flush worker stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Whether the loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Cancel the loop and wait up to [`STOP_JOIN_TIMEOUT`] for it to exit.
    ///
    /// Returns `false` if the task was still busy when the timeout expired; it
    /// is then left to finish its current cycle on its own.
    pub async fn stop(mut self) -> bool {
        self.cancel.cancel();
        let Some(handle) = self.handle.take() else {
            return true;
        };

        match tokio::time::timeout(STOP_JOIN_TIMEOUT, handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Flush worker exited abnormally");
                true
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = STOP_JOIN_TIMEOUT.as_millis() as u64,
                    "Flush worker did not stop in time, detaching"
                );
                false
            }
        }
    }
}

impl Drop for FlushWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_worker(interval: Duration) -> (FlushWorker, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let worker = FlushWorker::spawn(interval, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (worker, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_flushes_once_per_interval() {
        let (worker, ticks) = counting_worker(Duration::from_millis(1000));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        assert!(worker.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_sleep() {
        let (worker, ticks) = counting_worker(Duration::from_secs(60));
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        assert!(worker.stop().await);
        assert!(started.elapsed() < STOP_JOIN_TIMEOUT);
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_flush_after_stop() {
        let (worker, ticks) = counting_worker(Duration::from_millis(1000));
        assert!(worker.stop().await);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_bounded_by_slow_flush() {
        let worker = FlushWorker::spawn(Duration::from_millis(1000), || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        // Let the first flush begin.
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let started = tokio::time::Instant::now();
        assert!(!worker.stop().await);
        assert!(started.elapsed() >= STOP_JOIN_TIMEOUT);
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_loop() {
        let (worker, ticks) = counting_worker(Duration::from_millis(1000));
        drop(worker);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
