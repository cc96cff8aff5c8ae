//! Integration tests for pulse-sdk
//!
//! Tests the public API: engine lifecycle through a custom sink, and the HTTP
//! sink against a local collector.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{Json, Router, http::StatusCode, routing::post};
use pulse_sdk::{
    ConfigError, DeliveryError, EngineHandle, HttpSink, Observer, PulseConfig, TRACES_PATH,
    TraceSink,
};
use pulse_tracing::{Provider, TraceRecord, TraceStatus};
use serde_json::{Value, json};

const KEY: &str = "pulse_sk_integration";

/// Sink that keeps every batch in memory.
#[derive(Default)]
struct CapturingSink {
    batches: Mutex<Vec<Vec<TraceRecord>>>,
}

impl CapturingSink {
    fn batches(&self) -> Vec<Vec<TraceRecord>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl TraceSink for CapturingSink {
    fn name(&self) -> &str {
        "capturing"
    }

    async fn deliver(&self, batch: &[TraceRecord]) -> Result<(), DeliveryError> {
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}

/// Start a collector that answers every batch with `status`. Returns its base
/// URL and the batches it received.
async fn start_collector(status: StatusCode) -> (String, Arc<Mutex<Vec<Vec<Value>>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&received);

    let app = Router::new().route(
        TRACES_PATH,
        post(move |Json(batch): Json<Vec<Value>>| {
            let captured = Arc::clone(&captured);
            async move {
                captured.lock().unwrap().push(batch);
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{addr}"), received)
}

fn config(batch_size: u32) -> PulseConfig {
    PulseConfig::new(KEY)
        .with_batch_size(batch_size)
        .with_flush_interval_ms(60_000)
}

#[tokio::test]
async fn test_engine_with_custom_sink() {
    let sink = Arc::new(CapturingSink::default());
    let engine = EngineHandle::with_sink(sink.clone());
    engine.init(&config(2)).await.unwrap();

    let observer = Observer::new(engine.clone(), Provider::OpenAi);
    for i in 0..3 {
        let request = json!({"model": "gpt-4o-mini", "messages": [{"role": "user", "content": i.to_string()}]});
        observer
            .call(request.as_object().cloned().unwrap(), |_req| async {
                Ok::<_, std::io::Error>(json!({
                    "id": "chatcmpl-1",
                    "model": "gpt-4o-mini",
                    "choices": [{"message": {"content": "ok"}, "finish_reason": "stop"}],
                    "usage": {"prompt_tokens": 100, "completion_tokens": 50}
                }))
            })
            .await
            .unwrap();
    }

    assert_eq!(sink.batches().len(), 1);
    assert_eq!(engine.pending(), 1);
    assert_eq!(engine.flush_now().await, 1);

    let batches = sink.batches();
    assert_eq!(batches.len(), 2);
    let record = &batches[0][0];
    assert_eq!(record.status, TraceStatus::Success);
    assert_eq!(record.provider, Provider::OpenAi);
    assert_eq!(record.input_tokens, Some(100));
    assert!(record.cost_cents.unwrap() > 0.0);

    engine.stop().await;
    assert!(!engine.is_running().await);
}

#[tokio::test]
async fn test_init_rejects_bad_key() {
    let engine = EngineHandle::new();
    let err = engine
        .init(&PulseConfig::new("not-a-pulse-key"))
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidApiKey { .. }));
    assert!(!engine.is_enabled());
}

#[tokio::test]
async fn test_init_rejects_missing_key() {
    let engine = EngineHandle::new();
    let err = engine.init(&PulseConfig::default()).await.unwrap_err();
    assert_eq!(err, ConfigError::MissingApiKey);
}

#[tokio::test]
async fn test_http_engine_delivers_json_batch() {
    let (url, received) = start_collector(StatusCode::ACCEPTED).await;

    let engine = EngineHandle::new();
    engine.init(&config(2).with_api_url(&url)).await.unwrap();

    let observer = Observer::new(engine.clone(), Provider::Anthropic);
    for _ in 0..2 {
        let request = json!({"model": "claude-3-5-haiku", "max_tokens": 64, "pulse_session_id": "sess-9"});
        observer
            .call(request.as_object().cloned().unwrap(), |_req| async {
                Ok::<_, std::io::Error>(json!({
                    "id": "msg_1",
                    "model": "claude-3-5-haiku-20241022",
                    "content": [{"type": "text", "text": "hello"}],
                    "stop_reason": "end_turn",
                    "usage": {"input_tokens": 10, "output_tokens": 3}
                }))
            })
            .await
            .unwrap();
    }

    let batches = received.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    let first = &batches[0][0];
    assert_eq!(first["provider"], "anthropic");
    assert_eq!(first["session_id"], "sess-9");
    assert_eq!(first["output_text"], "hello");
    assert!(first["request_body"].get("pulse_session_id").is_none());

    assert_eq!(engine.stats().records_delivered, 2);
    engine.stop().await;
}

#[tokio::test]
async fn test_http_sink_rejection() {
    let (url, _received) = start_collector(StatusCode::UNAUTHORIZED).await;
    let sink = HttpSink::new(&url, KEY).unwrap();

    let record = pulse_tracing::TraceInput::failure(
        serde_json::Map::new(),
        pulse_tracing::ErrorDetail::new("Timeout", "timed out"),
        Provider::OpenRouter,
        Duration::from_millis(10),
    )
    .build();

    let err = sink.deliver(&[record]).await.unwrap_err();
    assert!(matches!(err, DeliveryError::Rejected { status: 401, .. }));
}

#[tokio::test]
async fn test_unreachable_collector_does_not_fail_producer() {
    // Reserve a port and close it so nothing is listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let engine = EngineHandle::new();
    engine
        .init(&config(1).with_api_url(format!("http://127.0.0.1:{port}")))
        .await
        .unwrap();

    let observer = Observer::new(engine.clone(), Provider::OpenAi);
    let result = observer
        .call(json!({"model": "gpt-4o"}).as_object().cloned().unwrap(), |_req| async {
            Ok::<_, std::io::Error>(json!({"model": "gpt-4o"}))
        })
        .await;

    assert!(result.is_ok());
    let stats = engine.stats();
    assert_eq!(stats.batches_failed, 1);
    assert_eq!(stats.records_dropped, 1);

    engine.stop().await;
}
