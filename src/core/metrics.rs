//! Prometheus metrics for request and integration latency.
//!
//! Two histogram families: `deps_latency_seconds` tracks end-to-end handler
//! latency per endpoint, `integration_latency_seconds` tracks individual
//! calls to Postgres, MinIO, and RabbitMQ per operation.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};

use crate::core::error::{AppError, Result};

/// Bucket ladder tuned for handlers that mostly finish well under a second.
/// Prometheus appends the +Inf bucket itself.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.125, 0.15, 0.175, 0.2, 0.25, 0.3, 0.5, 0.75, 1.0, 2.5,
    5.0, 7.5,
];

pub struct Metrics {
    registry: Registry,
    request_latency: HistogramVec,
    integration_latency: HistogramVec,
}

impl Metrics {
    /// Create and register the histogram families with a fresh registry.
    pub fn new() -> std::result::Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_latency = HistogramVec::new(
            HistogramOpts::new("deps_latency_seconds", "Request latency per endpoint")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["endpoint"],
        )?;
        let integration_latency = HistogramVec::new(
            HistogramOpts::new(
                "integration_latency_seconds",
                "Latency of database, storage, and queue operations",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["operation"],
        )?;

        registry.register(Box::new(request_latency.clone()))?;
        registry.register(Box::new(integration_latency.clone()))?;

        Ok(Self {
            registry,
            request_latency,
            integration_latency,
        })
    }

    pub fn observe_request(&self, endpoint: &str, seconds: f64) {
        self.request_latency
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    pub fn observe_integration(&self, operation: &str, seconds: f64) {
        self.integration_latency
            .with_label_values(&[operation])
            .observe(seconds);
    }

    /// Run `fut` and record its wall time under `operation`.
    pub async fn time_integration<T, F>(&self, operation: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let start = Instant::now();
        let out = fut.await;
        self.observe_integration(operation, start.elapsed().as_secs_f64());
        out
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> std::result::Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder.encode_to_string(&families)
    }
}

/// Records per-endpoint latency for every request passing through the router.
pub async fn track_metrics(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(req).await;
    metrics.observe_request(&endpoint, start.elapsed().as_secs_f64());

    response
}

/// `GET /metrics` in the Prometheus text format.
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Result<Response> {
    let body = metrics
        .encode()
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_both_histogram_families() {
        let metrics = Metrics::new().expect("metric registration should succeed");
        metrics.observe_request("/upload", 0.03);
        metrics.observe_integration("db_insert_file", 0.01);

        let families = metrics.registry.gather();
        assert!(families
            .iter()
            .any(|family| family.name() == "deps_latency_seconds"));
        assert!(families
            .iter()
            .any(|family| family.name() == "integration_latency_seconds"));
    }

    #[tokio::test]
    async fn time_integration_records_one_observation() {
        let metrics = Metrics::new().expect("metric registration should succeed");
        let value = metrics.time_integration("rabbit_publish", async { 7 }).await;
        assert_eq!(value, 7);

        let encoded = metrics.encode().expect("encoding should succeed");
        let expected = "integration_latency_seconds_count{operation=\"rabbit_publish\"} 1";
        assert!(encoded.contains(expected));
    }

    #[test]
    fn encode_emits_text_exposition_format() {
        let metrics = Metrics::new().expect("metric registration should succeed");
        metrics.observe_request("/file", 0.2);

        let encoded = metrics.encode().expect("encoding should succeed");
        assert!(encoded.contains("# TYPE deps_latency_seconds histogram"));
        assert!(encoded.contains("endpoint=\"/file\""));
    }
}
