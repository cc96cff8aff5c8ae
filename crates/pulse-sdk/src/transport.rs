//! HTTP delivery to the pulse collector.
//!
//! One `POST {api_url}/v1/traces/async` per batch, bearer-authenticated, with a
//! bounded timeout and no retry.

use std::time::Duration;

use async_trait::async_trait;
use pulse_tracing::TraceRecord;
use reqwest::{Client, header};

use crate::config::ResolvedConfig;
use crate::error::{ConfigError, DeliveryError};
use crate::sink::TraceSink;

/// Collector path batches are posted to.
pub const TRACES_PATH: &str = "/v1/traces/async";

/// Default timeout for a delivery request.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Sink that posts batches to the collector over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    url: String,
    api_key: String,
}

impl HttpSink {
    /// Create a sink for the given collector endpoint and key.
    pub fn new(api_url: &str, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_timeout(api_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a sink with a custom request timeout.
    pub fn with_timeout(
        api_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: traces_url(api_url),
            api_key: api_key.into(),
        })
    }

    /// Create a sink from a resolved engine config.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self, ConfigError> {
        Self::new(&config.api_url, config.api_key.clone())
    }
}

fn traces_url(api_url: &str) -> String {
    format!("{}{}", api_url.trim_end_matches('/'), TRACES_PATH)
}

#[async_trait]
impl TraceSink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, batch: &[TraceRecord]) -> Result<(), DeliveryError> {
        if batch.is_empty() {
            return Ok(());
        }

        let body = serde_json::to_vec(batch)?;

        let response = self
            .client
            .post(&self.url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::trace!(url = %self.url, records = batch.len(), "Batch accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCollector, fixtures};

    #[test]
    fn test_traces_url() {
        assert_eq!(
            traces_url("http://localhost:3000/"),
            "http://localhost:3000/v1/traces/async"
        );
        assert_eq!(
            traces_url("https://pulse.example.com/api"),
            "https://pulse.example.com/api/v1/traces/async"
        );
    }

    #[tokio::test]
    async fn test_deliver_posts_batch() {
        let collector = MockCollector::start().await;
        let sink = HttpSink::new(&collector.url(), "pulse_sk_abc").unwrap();

        let batch = vec![fixtures::success_record(), fixtures::error_record()];
        sink.deliver(&batch).await.unwrap();

        let received = collector.batches();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].len(), 2);
        assert_eq!(received[0][0].trace_id, batch[0].trace_id);
        assert_eq!(
            collector.authorizations(),
            vec!["Bearer pulse_sk_abc".to_string()]
        );

        collector.shutdown().await;
    }

    #[tokio::test]
    async fn test_rejected_status() {
        let collector = MockCollector::start().await;
        collector.respond_with(503, "collector overloaded");
        let sink = HttpSink::new(&collector.url(), "pulse_sk_abc").unwrap();

        let err = sink
            .deliver(&[fixtures::success_record()])
            .await
            .unwrap_err();

        match err {
            DeliveryError::Rejected { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "collector overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        collector.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_collector() {
        // Port 1 is never listening.
        let sink = HttpSink::with_timeout("http://127.0.0.1:1", "pulse_sk_abc", Duration::from_secs(2))
            .unwrap();

        let err = sink
            .deliver(&[fixtures::success_record()])
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Network(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let sink = HttpSink::new("http://127.0.0.1:1", "pulse_sk_abc").unwrap();
        assert!(sink.deliver(&[]).await.is_ok());
    }
}
