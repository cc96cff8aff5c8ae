//! Trace record construction.
//!
//! Turns the data gathered around one provider call (request, outcome, timing,
//! correlation info) into an immutable [`TraceRecord`]. Nothing here touches
//! shared state or performs I/O.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use crate::pricing::calculate_cost;
use crate::types::{
    CallOutcome, Document, ErrorDetail, NormalizedResponse, Provider, ResponseBody, TraceRecord,
    TraceStatus,
};

/// Request keys that carry a per-call session id.
pub const SESSION_ID_KEYS: [&str; 2] = ["pulse_session_id", "pulseSessionId"];
/// Request keys that carry per-call metadata.
pub const METADATA_KEYS: [&str; 2] = ["pulse_metadata", "pulseMetadata"];

/// Everything needed to build one record.
#[derive(Debug, Clone)]
pub struct TraceInput {
    pub request: Document,
    pub outcome: CallOutcome,
    pub provider: Provider,
    pub latency: Duration,
    pub session_id: Option<String>,
    pub metadata: Option<Document>,
}

impl TraceInput {
    /// Input for a call that produced a response.
    pub fn success(
        request: Document,
        response: NormalizedResponse,
        provider: Provider,
        latency: Duration,
    ) -> Self {
        Self {
            request,
            outcome: CallOutcome::Success(response),
            provider,
            latency,
            session_id: None,
            metadata: None,
        }
    }

    /// Input for a call that failed before producing a response.
    pub fn failure(
        request: Document,
        error: ErrorDetail,
        provider: Provider,
        latency: Duration,
    ) -> Self {
        Self {
            request,
            outcome: CallOutcome::Failure(error),
            provider,
            latency,
            session_id: None,
            metadata: None,
        }
    }

    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_metadata(mut self, metadata: Option<Document>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Build the record.
    pub fn build(self) -> TraceRecord {
        build_trace(self)
    }
}

/// Generate a fresh trace id.
pub fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Build a [`TraceRecord`] from a finished call.
///
/// On success the response fields are copied and, unless the response already
/// carries a cost, one is computed from the price table when both token counts
/// are known. On failure only the error block is filled in.
pub fn build_trace(input: TraceInput) -> TraceRecord {
    let TraceInput {
        request,
        outcome,
        provider,
        latency,
        session_id,
        metadata,
    } = input;

    let model_requested = match request.get("model") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    };

    let mut record = TraceRecord {
        trace_id: generate_trace_id(),
        timestamp: Utc::now(),
        provider,
        model_requested,
        model_used: None,
        provider_request_id: None,
        request_body: request,
        response_body: None,
        input_tokens: None,
        output_tokens: None,
        output_text: None,
        finish_reason: None,
        status: TraceStatus::Error,
        error: None,
        cost_cents: None,
        latency_ms: (latency.as_secs_f64() * 1000.0).round() as u64,
        session_id: session_id.filter(|s| !s.is_empty()),
        metadata: metadata.filter(|m| !m.is_empty()),
    };

    match outcome {
        CallOutcome::Success(response) => {
            let cost = response.cost_cents.or_else(|| {
                match (response.input_tokens, response.output_tokens) {
                    (Some(input), Some(output)) => calculate_cost(&response.model, input, output),
                    _ => None,
                }
            });

            record.status = TraceStatus::Success;
            record.response_body = Some(ResponseBody {
                content: response.content.clone(),
                input_tokens: response.input_tokens,
                output_tokens: response.output_tokens,
                finish_reason: response.finish_reason.clone(),
                model: response.model.clone(),
            });
            record.input_tokens = response.input_tokens;
            record.output_tokens = response.output_tokens;
            record.output_text = response.content;
            record.finish_reason = response.finish_reason;
            record.provider_request_id = response.provider_request_id;
            record.model_used = Some(response.model);
            record.cost_cents = cost;
        }
        CallOutcome::Failure(error) => {
            record.error = Some(error);
        }
    }

    record
}

/// Remove engine control keys from a request payload.
///
/// Returns the cleaned request together with the per-call session id and
/// metadata, if present. For each concern the first matching key wins; any
/// other spelling is still stripped.
pub fn extract_control_params(
    mut request: Document,
) -> (Document, Option<String>, Option<Document>) {
    let mut session_id = None;
    for key in SESSION_ID_KEYS {
        if let Some(value) = request.remove(key) {
            if session_id.is_none() {
                session_id = match value {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                };
            }
        }
    }

    let mut metadata = None;
    for key in METADATA_KEYS {
        if let Some(value) = request.remove(key) {
            if metadata.is_none() {
                if let Value::Object(map) = value {
                    metadata = Some(map);
                }
            }
        }
    }

    (request, session_id, metadata)
}

/// Combine per-client defaults with per-call overrides.
///
/// The per-call session id wins. Metadata is shallow-merged with per-call keys
/// replacing the client's.
pub fn resolve_session_and_metadata(
    default_session: Option<&str>,
    default_metadata: Option<&Document>,
    call_session: Option<String>,
    call_metadata: Option<Document>,
) -> (Option<String>, Option<Document>) {
    let session_id = call_session
        .filter(|s| !s.is_empty())
        .or_else(|| default_session.map(str::to_string));

    let mut metadata = default_metadata.cloned();
    if let Some(overrides) = call_metadata.filter(|m| !m.is_empty()) {
        metadata.get_or_insert_with(Document::new).extend(overrides);
    }

    (session_id, metadata)
}
