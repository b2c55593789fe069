//! Health check and metrics handlers
//!
//! Author: hephaex@gmail.com

use crate::state::{AppState, EndpointMetrics, LatencyBuckets};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub version: String,
    pub build_info: BuildInfo,
}

#[derive(Serialize, ToSchema)]
pub struct BuildInfo {
    #[schema(example = "entilens-api")]
    pub name: String,
}

/// Liveness probe - basic health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build_info: BuildInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
        },
    })
}

/// Readiness response
#[derive(Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessChecks {
    /// Model used when a request names none
    pub default_model: String,
    /// The default model answered its availability probe
    pub default_model_available: bool,
    /// Scanned PDFs can be read
    pub ocr_available: bool,
}

/// Readiness probe - checks the default model
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse),
        (status = 503, description = "Service not ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let registry = state.pipeline.recognizers();
    let default_model = registry.default_model().to_string();
    let default_model_available = match registry.get(None) {
        Ok(recognizer) => recognizer.is_available().await,
        Err(_) => false,
    };

    let ready = default_model_available;
    let response = ReadinessResponse {
        ready,
        checks: ReadinessChecks {
            default_model,
            default_model_available,
            ocr_available: state.pipeline.ocr_available(),
        },
    };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// JSON metrics response
#[derive(Serialize, ToSchema)]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub requests_per_second: f64,
    pub extractions_total: u64,
    pub entities_total: u64,
    pub sessions_saved: usize,
}

/// Service metrics as JSON
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses(
        (status = 200, description = "Service metrics", body = MetricsResponse)
    )
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.uptime_secs();
    let total_requests = state.get_request_count();
    let rps = if uptime > 0 {
        total_requests as f64 / uptime as f64
    } else {
        0.0
    };

    Json(MetricsResponse {
        uptime_seconds: uptime,
        total_requests,
        requests_per_second: rps,
        extractions_total: state.get_extraction_count(),
        entities_total: state.get_entity_count(),
        sessions_saved: state.sessions.len().await,
    })
}

/// Prometheus-compatible metrics endpoint
pub async fn prometheus_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut output = String::new();

    let gauges = [
        ("entilens_uptime_seconds", "Time since server start", "gauge", state.uptime_secs()),
        ("entilens_requests_total", "Total number of HTTP requests", "counter", state.get_request_count()),
        ("entilens_extractions_total", "Completed entity extractions", "counter", state.get_extraction_count()),
        ("entilens_entities_total", "Entities returned across all extractions", "counter", state.get_entity_count()),
        ("entilens_sessions_saved", "Sessions currently kept in memory", "gauge", state.sessions.len().await as u64),
    ];
    for (name, help, kind, value) in gauges {
        let _ = write!(output, "# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n\n");
    }

    output.push_str("# HELP entilens_build_info Build information\n");
    output.push_str("# TYPE entilens_build_info gauge\n");
    let _ = writeln!(
        output,
        "entilens_build_info{{version=\"{}\"}} 1\n",
        env!("CARGO_PKG_VERSION")
    );

    let metrics = state.metrics.read().await;
    let mut endpoints: Vec<(&String, &EndpointMetrics)> = metrics.iter().collect();
    endpoints.sort_by(|a, b| a.0.cmp(b.0));

    // Request counts by endpoint and status
    output.push_str("# HELP entilens_http_requests_total HTTP requests by endpoint and status\n");
    output.push_str("# TYPE entilens_http_requests_total counter\n");
    for (endpoint, endpoint_metrics) in &endpoints {
        for (status, count) in &endpoint_metrics.status_counts {
            let _ = writeln!(
                output,
                "entilens_http_requests_total{{endpoint=\"{endpoint}\",status=\"{status}\"}} {count}"
            );
        }
    }
    output.push('\n');

    // Request latency histogram
    output.push_str("# HELP entilens_http_request_duration_seconds HTTP request latency\n");
    output.push_str("# TYPE entilens_http_request_duration_seconds histogram\n");
    for (endpoint, endpoint_metrics) in &endpoints {
        if endpoint_metrics.latency_count == 0 {
            continue;
        }

        let mut cumulative = 0u64;
        for (le, count) in LatencyBuckets::BOUNDS
            .iter()
            .zip(endpoint_metrics.latency_buckets.finite())
        {
            cumulative += count;
            let _ = writeln!(
                output,
                "entilens_http_request_duration_seconds_bucket{{endpoint=\"{endpoint}\",le=\"{le}\"}} {cumulative}"
            );
        }
        cumulative += endpoint_metrics.latency_buckets.over_1s;
        let _ = writeln!(
            output,
            "entilens_http_request_duration_seconds_bucket{{endpoint=\"{endpoint}\",le=\"+Inf\"}} {cumulative}"
        );

        let total_sum_s = endpoint_metrics.total_latency_us as f64 / 1_000_000.0;
        let _ = writeln!(
            output,
            "entilens_http_request_duration_seconds_sum{{endpoint=\"{endpoint}\"}} {total_sum_s:.6}"
        );
        let _ = writeln!(
            output,
            "entilens_http_request_duration_seconds_count{{endpoint=\"{endpoint}\"}} {}",
            endpoint_metrics.latency_count
        );
    }
    output.push('\n');

    // Latency quantiles approximated from the histogram
    output.push_str("# HELP entilens_http_request_duration_seconds_summary HTTP request latency summary\n");
    output.push_str("# TYPE entilens_http_request_duration_seconds_summary summary\n");
    for (endpoint, endpoint_metrics) in &endpoints {
        if endpoint_metrics.latency_count == 0 {
            continue;
        }
        for quantile in [0.5, 0.9, 0.99] {
            let _ = writeln!(
                output,
                "entilens_http_request_duration_seconds_summary{{endpoint=\"{endpoint}\",quantile=\"{quantile}\"}} {:.6}",
                approximate_quantile(endpoint_metrics, quantile)
            );
        }
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        output,
    )
}

/// Midpoint of the bucket holding the given quantile
fn approximate_quantile(metrics: &EndpointMetrics, quantile: f64) -> f64 {
    const MIDPOINTS: [f64; 6] = [0.005, 0.03, 0.075, 0.3, 0.75, 1.5];

    let threshold = (metrics.latency_count as f64 * quantile).ceil() as u64;
    let buckets = metrics.latency_buckets.finite();

    let mut cumulative = 0u64;
    for (count, midpoint) in buckets.iter().zip(MIDPOINTS) {
        cumulative += count;
        if cumulative >= threshold {
            return midpoint;
        }
    }
    MIDPOINTS[5]
}
