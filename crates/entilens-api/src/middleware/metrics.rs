//! Metrics tracking middleware
//!
//! Records per-endpoint status counts and latency for the metrics endpoints.
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Requests slower than this are logged
const SLOW_REQUEST: Duration = Duration::from_secs(5);

/// Series for requests that matched no route
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let endpoint = endpoint_key(&request);

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    if elapsed >= SLOW_REQUEST {
        tracing::warn!(
            endpoint = %endpoint,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Slow request"
        );
    }

    state
        .record_request(endpoint, status, elapsed.as_micros() as u64)
        .await;

    response
}

/// Route template such as `/api/v1/sessions/:id`, so ids and stray paths
/// never open new series
fn endpoint_key(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string())
}
