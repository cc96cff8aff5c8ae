//! Observed provider calls.
//!
//! An [`Observer`] wraps each call to a provider client: it strips pulse
//! control keys from the request, times the call, records a trace for the
//! outcome, and hands the call's own result back unchanged.

use std::future::Future;
use std::time::Instant;

use pulse_tracing::{
    Document, ErrorDetail, Provider, TraceInput, extract_control_params,
    resolve_session_and_metadata,
};

use crate::engine::EngineHandle;
use crate::normalize::Normalize;

/// Per-client defaults applied to every observed call.
#[derive(Debug, Clone, Default)]
pub struct ObserveOptions {
    pub session_id: Option<String>,
    pub metadata: Option<Document>,
}

impl ObserveOptions {
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Document) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Wraps calls to one provider client.
#[derive(Debug, Clone)]
pub struct Observer {
    engine: EngineHandle,
    provider: Provider,
    options: ObserveOptions,
}

impl Observer {
    pub fn new(engine: EngineHandle, provider: Provider) -> Self {
        Self {
            engine,
            provider,
            options: ObserveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ObserveOptions) -> Self {
        self.options = options;
        self
    }

    /// Run `call` with the cleaned request and record what happened.
    ///
    /// The result of `call` is returned as-is; a failed call is recorded with
    /// status `error` and its error is still returned to the caller.
    pub async fn call<F, Fut, R, E>(&self, request: Document, call: F) -> Result<R, E>
    where
        F: FnOnce(Document) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: Normalize,
        E: std::fmt::Display,
    {
        let (clean, call_session, call_metadata) = extract_control_params(request);

        if !self.engine.is_enabled() {
            return call(clean).await;
        }

        let (session_id, metadata) = resolve_session_and_metadata(
            self.options.session_id.as_deref(),
            self.options.metadata.as_ref(),
            call_session,
            call_metadata,
        );
        let recorded_request = clean.clone();

        let started = Instant::now();
        let result = call(clean).await;
        let latency = started.elapsed();

        let input = match &result {
            Ok(response) => TraceInput::success(
                recorded_request,
                response.normalize(self.provider),
                self.provider,
                latency,
            ),
            Err(error) => TraceInput::failure(
                recorded_request,
                ErrorDetail::from_error(error),
                self.provider,
                latency,
            ),
        };

        self.engine
            .record_if_enabled(input.with_session_id(session_id).with_metadata(metadata))
            .await;

        result
    }
}
