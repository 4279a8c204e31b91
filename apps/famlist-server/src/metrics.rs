//! Prometheus metrics for famlist-server.
//!
//! Exposes server metrics in Prometheus format at the `/metrics` endpoint.

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder and return a handle for rendering.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    describe_counter!(
        "famlist_http_requests_total",
        "Total number of HTTP requests processed"
    );
    describe_histogram!(
        "famlist_http_request_duration_seconds",
        "Duration of HTTP requests in seconds"
    );

    handle
}

/// Middleware recording per-route request counts and latencies.
pub async fn track_http(request: Request<axum::body::Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();
    // Matched route template, not the raw path, to keep label cardinality low.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = request.method().as_str().to_owned();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(
        "famlist_http_requests_total",
        "method" => method.clone(), "path" => path.clone(), "status" => status
    )
    .increment(1);
    histogram!(
        "famlist_http_request_duration_seconds",
        "method" => method, "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}
