//! Service middleware for request metrics.
//!
//! ## Metrics Exposed
//!
//! - `request` - one record per HTTP request by path pattern, method, status
//! - `dispatch` - one record per delivered event by kind and request count

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing records that can be aggregated from logs.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "glyph_composer::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Numeric path segments become `:id`.
fn normalize_path(path: &str) -> String {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    let numeric = NUMERIC.get_or_init(|| {
        Regex::new(r"/-?[0-9]+(/|$)").expect("numeric segment pattern is valid")
    });
    // Applied twice so adjacent numeric segments are both replaced.
    let once = numeric.replace_all(path, "/:id$1");
    numeric.replace_all(&once, "/:id$1").to_string()
}

/// Record the outcome of one delivered event.
pub fn record_dispatch(kind: &str, requests: usize, latency_ms: u64, success: bool) {
    let status = if success { "success" } else { "error" };
    info!(
        target: "glyph_composer::metrics",
        metric_type = "dispatch",
        kind = kind,
        requests = requests,
        status = status,
        latency_ms = latency_ms,
        "dispatch_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_numbers() {
        assert_eq!(normalize_path("/api/chats/12345/messages/7"), "/api/chats/:id/messages/:id");
        assert_eq!(normalize_path("/api/chats/-100/1/2"), "/api/chats/:id/:id/:id");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/health/live"), "/health/live");
        assert_eq!(normalize_path("/api/v2catalog"), "/api/v2catalog");
    }
}
