//! Process-wide counters and request accounting

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

/// Response header carrying the id of the request's log span
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long in-flight requests may take to finish after a shutdown signal
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime counters reported by `/health`
#[derive(Debug, Clone)]
pub struct ServiceMetrics {
    pub requests_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
    /// Requests currently being handled; reported when the drain times out.
    pub in_flight: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }
}

/// Count every request and record its status and latency in Prometheus.
/// Responses with a 5xx status count as errors.
///
/// Each request runs inside a span tagged with a fresh `req_` id, which is
/// echoed back in `x-request-id`.
pub async fn track_requests(
    State(metrics): State<ServiceMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );
    let started = Instant::now();
    metrics.requests_total.fetch_add(1, Ordering::Relaxed);
    metrics.in_flight.fetch_add(1, Ordering::Relaxed);

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
    let status = response.status();
    if status.is_server_error() {
        metrics.errors_total.fetch_add(1, Ordering::Relaxed);
    }
    crate::metrics::record_request(
        status.as_u16(),
        &method,
        &route,
        started.elapsed().as_secs_f64(),
    );
    response
}
