//! Test fixtures for common trace scenarios.
//!
//! Provides pre-built requests, responses, and records to reduce test boilerplate.

use std::time::Duration;

use pulse_tracing::{
    Document, ErrorDetail, NormalizedResponse, Provider, TraceInput, TraceRecord,
};
use serde_json::{Value, json};

use crate::config::PulseConfig;

/// API key accepted by config validation.
pub const TEST_API_KEY: &str = "pulse_sk_test_key";

// ============================================================================
// Config Helpers
// ============================================================================

/// Config with the given batch size and flush interval.
pub fn config(batch_size: u32, flush_interval_ms: u64) -> PulseConfig {
    PulseConfig::new(TEST_API_KEY)
        .with_batch_size(batch_size)
        .with_flush_interval_ms(flush_interval_ms)
}

// ============================================================================
// Request / Response Helpers
// ============================================================================

/// Convert a `json!` object into a request document.
pub fn document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A minimal chat request for the given model.
pub fn chat_request(model: &str) -> Document {
    document(json!({
        "model": model,
        "messages": [{"role": "user", "content": "Hello"}]
    }))
}

/// A normalized response with usage for a priced model.
pub fn normalized_response() -> NormalizedResponse {
    NormalizedResponse::new("gpt-4o-mini")
        .with_content("Hi!")
        .with_usage(12, 4)
        .with_finish_reason("stop")
}

/// An OpenAI chat completion body.
pub fn openai_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
    })
}

/// An Anthropic messages response body.
pub fn anthropic_message(text: &str) -> Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-haiku-20241022",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 20, "output_tokens": 8}
    })
}

// ============================================================================
// Record Helpers
// ============================================================================

/// A successful OpenAI trace record.
pub fn success_record() -> TraceRecord {
    TraceInput::success(
        chat_request("gpt-4o-mini"),
        normalized_response(),
        Provider::OpenAi,
        Duration::from_millis(120),
    )
    .build()
}

/// A failed Anthropic trace record.
pub fn error_record() -> TraceRecord {
    TraceInput::failure(
        chat_request("claude-3-5-haiku"),
        ErrorDetail::new("APIConnectionError", "Connection error."),
        Provider::Anthropic,
        Duration::from_millis(30),
    )
    .build()
}
