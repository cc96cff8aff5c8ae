//! Cross-crate integration and E2E tests
//!
//! These tests run traces built by pulse-tracing through the pulse-sdk engine
//! and the real HTTP sink into a mock collector.

use std::sync::Arc;
use std::time::Duration;

use pulse_sdk::testing::{MockCollector, MockSink, fixtures};
use pulse_sdk::{EngineHandle, ObserveOptions, Observer, PulseConfig};
use pulse_tracing::{Provider, TraceStatus, parse_traces, read_traces};
use serde_json::{Value, json};

/// Get an available port for testing.
fn get_test_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn collector_config(url: &str, batch_size: u32, flush_interval_ms: u64) -> PulseConfig {
    fixtures::config(batch_size, flush_interval_ms).with_api_url(url)
}

#[derive(Debug)]
struct RateLimited;

impl std::fmt::Display for RateLimited {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "429 Too Many Requests")
    }
}

/// E2E Test: observed calls reach the collector with auth and full records
///
/// 1. Observer records a success and a failure
/// 2. The second record crosses the batch threshold
/// 3. The collector receives one batch with the bearer token
#[tokio::test]
async fn test_e2e_observer_to_collector() {
    let collector = MockCollector::start().await;
    let engine = EngineHandle::new();
    engine
        .init(&collector_config(&collector.url(), 2, 60_000))
        .await
        .unwrap();

    let observer = Observer::new(engine.clone(), Provider::OpenAi).with_options(
        ObserveOptions::default()
            .with_session_id("session-e2e")
            .with_metadata(fixtures::document(json!({"feature": "chat"}))),
    );

    observer
        .call(fixtures::chat_request("gpt-4o-mini"), |_req| async {
            Ok::<_, RateLimited>(fixtures::openai_completion("Hello!"))
        })
        .await
        .unwrap();
    let err = observer
        .call(fixtures::chat_request("gpt-4o-mini"), |_req| async {
            Err::<Value, _>(RateLimited)
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "429 Too Many Requests");

    let batches = collector.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        collector.authorizations(),
        vec![format!("Bearer {}", fixtures::TEST_API_KEY)]
    );

    let batch = &batches[0];
    assert_eq!(batch.len(), 2);

    let ok = &batch[0];
    assert_eq!(ok.status, TraceStatus::Success);
    assert_eq!(ok.model_requested, "gpt-4o-mini");
    assert_eq!(ok.output_text.as_deref(), Some("Hello!"));
    assert_eq!(ok.session_id.as_deref(), Some("session-e2e"));
    assert_eq!(ok.metadata.as_ref().unwrap()["feature"], "chat");

    let failed = &batch[1];
    assert_eq!(failed.status, TraceStatus::Error);
    assert_eq!(failed.error.as_ref().unwrap().name, "RateLimited");
    assert!(failed.response_body.is_none());

    engine.stop().await;
    collector.shutdown().await;
}

/// E2E Test: the worker ships partial batches on its own
#[tokio::test]
async fn test_e2e_timer_flush() {
    let collector = MockCollector::start().await;
    let engine = EngineHandle::new();
    engine
        .init(&collector_config(&collector.url(), 50, 1_000))
        .await
        .unwrap();

    engine.record(fixtures::success_record()).await;
    engine.record(fixtures::error_record()).await;
    assert_eq!(collector.record_count(), 0);

    // Wait out one interval plus delivery.
    let mut waited = Duration::ZERO;
    while collector.record_count() < 2 && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        waited += Duration::from_millis(100);
    }

    assert_eq!(collector.batches().len(), 1);
    assert_eq!(collector.record_count(), 2);
    assert_eq!(engine.pending(), 0);

    engine.stop().await;
    collector.shutdown().await;
}

/// E2E Test: a rejecting collector never surfaces to the producer
#[tokio::test]
async fn test_e2e_collector_rejects() {
    let collector = MockCollector::start().await;
    collector.respond_with(401, r#"{"error":"invalid api key"}"#);

    let engine = EngineHandle::new();
    engine
        .init(&collector_config(&collector.url(), 1, 60_000))
        .await
        .unwrap();

    engine.record(fixtures::success_record()).await;
    engine.record(fixtures::success_record()).await;

    // Each batch is attempted exactly once.
    assert_eq!(collector.batches().len(), 2);
    let stats = engine.stats();
    assert_eq!(stats.batches_failed, 2);
    assert_eq!(stats.records_dropped, 2);
    assert_eq!(stats.records_delivered, 0);

    engine.stop().await;
    collector.shutdown().await;
}

/// E2E Test: collector down entirely
#[tokio::test]
async fn test_e2e_collector_down() {
    let url = format!("http://127.0.0.1:{}", get_test_port());
    let engine = EngineHandle::new();
    engine.init(&collector_config(&url, 2, 60_000)).await.unwrap();

    engine.record(fixtures::success_record()).await;
    engine.record(fixtures::success_record()).await;

    assert_eq!(engine.pending(), 0);
    assert_eq!(engine.stats().records_dropped, 2);

    // Still accepting traces afterwards.
    engine.record(fixtures::success_record()).await;
    assert_eq!(engine.pending(), 1);

    engine.stop().await;
}

/// E2E Test: re-initialize against a new collector
#[tokio::test]
async fn test_e2e_reinitialize_switches_collector() {
    let first = MockCollector::start().await;
    let second = MockCollector::start().await;

    let engine = EngineHandle::new();
    engine
        .init(&collector_config(&first.url(), 1, 60_000))
        .await
        .unwrap();
    engine.record(fixtures::success_record()).await;

    engine
        .init(&collector_config(&second.url(), 1, 60_000))
        .await
        .unwrap();
    engine.record(fixtures::success_record()).await;

    assert_eq!(first.record_count(), 1);
    assert_eq!(second.record_count(), 1);

    engine.stop().await;
    first.shutdown().await;
    second.shutdown().await;
}

/// E2E Test: records written as JSONL replay through the engine unchanged
#[tokio::test]
async fn test_e2e_jsonl_replay() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("traces.jsonl");

    let originals = vec![fixtures::success_record(), fixtures::error_record()];
    let mut content = String::new();
    for record in &originals {
        content.push_str(&serde_json::to_string(record).unwrap());
        content.push_str("\n\n");
    }
    std::fs::write(&path, &content).unwrap();

    let loaded = read_traces(&path).unwrap();
    assert_eq!(loaded.len(), parse_traces(&content).unwrap().len());
    assert_eq!(loaded[1].status, TraceStatus::Error);

    let sink = Arc::new(MockSink::new());
    let engine = EngineHandle::with_sink(sink.clone());
    engine.init(&fixtures::config(10, 60_000)).await.unwrap();
    for record in loaded {
        engine.record(record).await;
    }
    assert_eq!(engine.flush_now().await, 2);

    let delivered: Vec<_> = sink.records().into_iter().map(|r| r.trace_id).collect();
    let expected: Vec<_> = originals.into_iter().map(|r| r.trace_id).collect();
    assert_eq!(delivered, expected);
    engine.stop().await;
}
