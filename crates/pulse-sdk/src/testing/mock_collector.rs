//! HTTP mock collector for integration testing.
//!
//! Provides an HTTP server that mimics the pulse trace collector so the real
//! [`HttpSink`](crate::transport::HttpSink) can be exercised end to end.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use pulse_tracing::TraceRecord;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::transport::TRACES_PATH;

#[derive(Debug)]
struct CollectorState {
    batches: Mutex<Vec<Vec<TraceRecord>>>,
    authorizations: Mutex<Vec<String>>,
    reply: Mutex<(StatusCode, String)>,
}

/// A mock trace collector.
///
/// Starts a local HTTP server that accepts `POST /v1/traces/async`, records
/// each batch and its `Authorization` header, and answers with a configurable
/// status.
///
/// # Example
///
/// ```ignore
/// use pulse_sdk::testing::MockCollector;
///
/// let collector = MockCollector::start().await;
/// let sink = HttpSink::new(&collector.url(), "pulse_sk_test")?;
/// // ... deliver ...
/// assert_eq!(collector.batches().len(), 1);
/// collector.shutdown().await;
/// ```
pub struct MockCollector {
    /// Server address.
    addr: SocketAddr,
    /// Captured traffic and configured reply.
    state: Arc<CollectorState>,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Server task handle.
    handle: Option<JoinHandle<()>>,
}

impl MockCollector {
    /// Start a new collector on a random available port.
    pub async fn start() -> Self {
        let state = Arc::new(CollectorState {
            batches: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
            reply: Mutex::new((StatusCode::ACCEPTED, String::new())),
        });

        let app = Router::new()
            .route(TRACES_PATH, post(handle_traces))
            .with_state(Arc::clone(&state));

        // Bind to a random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock collector");
        let addr = listener.local_addr().expect("Failed to get local address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Get the collector's base URL.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer subsequent requests with this status and body.
    pub fn respond_with(&self, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).expect("valid status code");
        *self.state.reply.lock().unwrap() = (status, body.into());
    }

    /// Batches received so far, in arrival order.
    pub fn batches(&self) -> Vec<Vec<TraceRecord>> {
        self.state.batches.lock().unwrap().clone()
    }

    /// Total records received across all batches.
    pub fn record_count(&self) -> usize {
        self.state.batches.lock().unwrap().iter().map(Vec::len).sum()
    }

    /// `Authorization` header of each request.
    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().unwrap().clone()
    }

    /// Shutdown the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

/// Handle POST /v1/traces/async
async fn handle_traces(
    State(state): State<Arc<CollectorState>>,
    headers: HeaderMap,
    Json(batch): Json<Vec<TraceRecord>>,
) -> impl IntoResponse {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.authorizations.lock().unwrap().push(auth);
    state.batches.lock().unwrap().push(batch);

    let (status, body) = state.reply.lock().unwrap().clone();
    (status, body)
}
