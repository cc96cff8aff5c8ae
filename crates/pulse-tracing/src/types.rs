//! Trace record data types.
//!
//! A [`TraceRecord`] describes one observed call to an LLM provider: the request
//! that was sent, what came back (or how it failed), timing, and cost. Records are
//! built once by [`crate::builder`] and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A JSON object, used for request bodies and metadata maps.
pub type Document = Map<String, Value>;

/// The provider an observed call was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic messages.
    Anthropic,
    /// OpenRouter (OpenAI-compatible aggregator).
    OpenRouter,
}

impl Provider {
    /// Wire name of the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::OpenRouter => "openrouter",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome status of an observed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Success,
    Error,
}

/// A provider response reduced to the fields the collector cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResponse {
    /// Model that actually served the request.
    pub model: String,
    pub content: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub finish_reason: Option<String>,

    /// Cost reported by the upstream API itself, in cents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_cents: Option<f64>,

    /// Provider-assigned request/message id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_request_id: Option<String>,
}

impl NormalizedResponse {
    /// Create a response for the given model with no content or usage.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: None,
            input_tokens: None,
            output_tokens: None,
            finish_reason: None,
            cost_cents: None,
            provider_request_id: None,
        }
    }

    /// Set the text content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set input/output token counts.
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }

    /// Set the finish reason.
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    /// Set an upstream-reported cost in cents.
    pub fn with_cost_cents(mut self, cost: f64) -> Self {
        self.cost_cents = Some(cost);
        self
    }
}

/// Response block as it appears in a serialized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub content: Option<String>,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub finish_reason: Option<String>,
    pub model: String,
}

/// Error block: kind name plus message of the failure that ended the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub name: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Capture an error's type name (last path segment) and display message.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: fmt::Display + ?Sized,
    {
        Self {
            name: short_type_name(std::any::type_name::<E>()).to_string(),
            message: error.to_string(),
        }
    }
}

/// Smart pointers whose pointee names the error better than they do.
const WRAPPERS: &[&str] = &["Box", "Arc", "Rc"];

/// Prefix of `s` up to the first top-level char matching `stop`, or an unmatched `>`.
fn until_top_level(s: &str, stop: impl Fn(char) -> bool) -> &str {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if depth == 0 => return &s[..i],
            '>' => depth -= 1,
            c if depth == 0 && stop(c) => return &s[..i],
            _ => {}
        }
    }
    s
}

/// Last path segment of a type name, looking through references, `dyn`
/// bounds and pointer wrappers such as `Box<dyn Error + Send>`.
fn short_type_name(full: &str) -> &str {
    let mut name = full;
    loop {
        name = name
            .trim()
            .trim_start_matches('&')
            .trim_start_matches("mut ")
            .trim_start_matches("dyn ");
        let head = until_top_level(name, |c| c == '+').trim();
        let (path, args) = match head.split_once('<') {
            Some((path, args)) => (path, Some(args)),
            None => (head, None),
        };
        let segment = path.rsplit("::").next().unwrap_or(path);
        match args {
            Some(args) if WRAPPERS.contains(&segment) => {
                name = until_top_level(args, |c| c == ',');
            }
            _ => return segment,
        }
    }
}

/// How an observed call ended.
///
/// Exactly one of a response or an error ever reaches a record.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(NormalizedResponse),
    Failure(ErrorDetail),
}

/// One observed provider call, ready to ship to the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Unique identifier for this trace.
    pub trace_id: String,

    /// When the record was built.
    pub timestamp: DateTime<Utc>,

    pub provider: Provider,

    /// Model named in the request (`"unknown"` if the request had none).
    pub model_requested: String,

    /// Model reported by the response. Absent on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_request_id: Option<String>,

    /// Request payload with engine control keys already removed.
    pub request_body: Document,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<ResponseBody>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,

    pub status: TraceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,

    /// Cost in cents. Absent means unknown, not free.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_cents: Option<f64>,

    /// Wall-clock latency of the call in whole milliseconds.
    pub latency_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,
}

impl TraceRecord {
    /// Whether the record describes a failed call.
    pub fn is_error(&self) -> bool {
        self.status == TraceStatus::Error
    }
}
