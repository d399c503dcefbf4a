//! Request metrics in Prometheus text format
//!
//! Each [`Metrics`] owns a private registry rather than the process-global
//! default.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

const NAMESPACE: &str = "miso";

/// Request counters and latency histograms shared by the registry and
/// health routers
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("requests_total", "Registry requests served").namespace(NAMESPACE),
            &["method", "status"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("request_duration_seconds", "Registry request latency")
                .namespace(NAMESPACE),
            &["method"],
        )?;
        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                requests,
                latency,
            }),
        })
    }

    /// Record one finished request
    pub fn observe(&self, method: &str, status: u16, started: Instant) {
        let status = status.to_string();
        self.inner
            .requests
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.inner
            .latency
            .with_label_values(&[method])
            .observe(started.elapsed().as_secs_f64());
    }

    /// Current values in the Prometheus text exposition format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.inner.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

/// Middleware counting every request that reaches the registry router
pub(crate) async fn observe_requests(
    State(metrics): State<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    metrics.observe(method.as_str(), response.status().as_u16(), started);
    response
}

pub(crate) async fn scrape(State(metrics): State<Metrics>) -> Response {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
