//! Provider response normalization.
//!
//! Reduces raw OpenAI-style and Anthropic response bodies to a
//! [`NormalizedResponse`]. Missing fields become `None`; nothing here fails.

use pulse_tracing::{NormalizedResponse, Provider};
use serde_json::Value;

/// Something an observed call returns that can be reduced to a
/// [`NormalizedResponse`].
pub trait Normalize {
    fn normalize(&self, provider: Provider) -> NormalizedResponse;
}

impl Normalize for NormalizedResponse {
    fn normalize(&self, _provider: Provider) -> NormalizedResponse {
        self.clone()
    }
}

impl Normalize for Value {
    fn normalize(&self, provider: Provider) -> NormalizedResponse {
        match provider {
            Provider::OpenAi | Provider::OpenRouter => normalize_openai(self),
            Provider::Anthropic => normalize_anthropic(self),
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn model_of(value: &Value) -> String {
    str_field(value, "model").unwrap_or_else(|| "unknown".to_string())
}

/// Normalize an OpenAI (or OpenRouter) chat completion.
///
/// OpenRouter reports a top-level `cost` in dollars; it is carried over in cents.
pub fn normalize_openai(response: &Value) -> NormalizedResponse {
    let choice = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first());
    let usage = response.get("usage");

    NormalizedResponse {
        model: model_of(response),
        content: choice
            .and_then(|c| c.get("message"))
            .and_then(|m| str_field(m, "content")),
        input_tokens: usage
            .and_then(|u| u.get("prompt_tokens"))
            .and_then(Value::as_u64),
        output_tokens: usage
            .and_then(|u| u.get("completion_tokens"))
            .and_then(Value::as_u64),
        finish_reason: choice.and_then(|c| str_field(c, "finish_reason")),
        cost_cents: response
            .get("cost")
            .and_then(Value::as_f64)
            .map(|dollars| dollars * 100.0),
        provider_request_id: str_field(response, "id"),
    }
}

/// Map Anthropic stop reasons onto OpenAI-style finish reasons.
fn map_stop_reason(reason: &str) -> String {
    match reason {
        "end_turn" | "stop_sequence" => "stop",
        "max_tokens" => "length",
        "tool_use" => "tool_calls",
        other => other,
    }
    .to_string()
}

/// Normalize an Anthropic messages response.
pub fn normalize_anthropic(response: &Value) -> NormalizedResponse {
    let text: String = response
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    let usage = response.get("usage");

    NormalizedResponse {
        model: model_of(response),
        content: (!text.is_empty()).then_some(text),
        input_tokens: usage
            .and_then(|u| u.get("input_tokens"))
            .and_then(Value::as_u64),
        output_tokens: usage
            .and_then(|u| u.get("output_tokens"))
            .and_then(Value::as_u64),
        finish_reason: response
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(map_stop_reason),
        cost_cents: None,
        provider_request_id: str_field(response, "id"),
    }
}
