//! LLM call trace records.
//!
//! This crate provides the data side of pulse telemetry:
//!
//! - **Types**: `TraceRecord` and the pieces it is built from
//! - **Builder**: pure construction of records from a finished call
//! - **Pricing**: static per-model price table used to fill in cost
//! - **JSONL**: reading previously captured records
//!
//! # Usage
//!
//! ```rust
//! use std::time::Duration;
//! use pulse_tracing::{Document, NormalizedResponse, Provider, TraceInput, TraceStatus};
//!
//! let mut request = Document::new();
//! request.insert("model".into(), "gpt-4o".into());
//!
//! let response = NormalizedResponse::new("gpt-4o")
//!     .with_content("Hello!")
//!     .with_usage(12, 3);
//!
//! let record = TraceInput::success(request, response, Provider::OpenAi, Duration::from_millis(420))
//!     .with_session_id(Some("checkout-flow".to_string()))
//!     .build();
//!
//! assert_eq!(record.status, TraceStatus::Success);
//! assert!(record.cost_cents.is_some());
//! ```

pub mod builder;
pub mod jsonl;
pub mod pricing;
pub mod types;

pub use builder::{
    TraceInput, build_trace, extract_control_params, generate_trace_id,
    resolve_session_and_metadata,
};
pub use jsonl::{JsonlError, parse_traces, read_traces};
pub use pricing::{ModelPricing, calculate_cost, resolve_pricing};
pub use types::{
    CallOutcome, Document, ErrorDetail, NormalizedResponse, Provider, ResponseBody, TraceRecord,
    TraceStatus,
};
