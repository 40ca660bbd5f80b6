//! Axum routes for the composer service.

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::picker::PickerPage;
use crate::types::{InboundEvent, OutboundRequest};

use super::middleware::{metrics_middleware, record_dispatch};
use super::state::ServiceState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Requests produced by one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    /// Correlation id of this delivery.
    pub correlation_id: String,
    /// Outbound requests in the order they were issued.
    pub requests: Vec<OutboundRequest>,
}

/// Query of the catalog endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Requested page, clamped into range.
    #[serde(default)]
    pub page: i64,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog_size: usize,
    pub approvers: usize,
    pub sessions: usize,
    /// Content hash of the current stores.
    pub fingerprint: String,
    pub uptime_secs: u64,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            code = %self.code,
            error = %self.error,
            correlation_id = ?self.correlation_id,
            "Request error"
        );
        (StatusCode::BAD_GATEWAY, Json(self)).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Deliver one inbound event to the composer.
async fn events_handler(
    State(state): State<ServiceState>,
    Json(event): Json<InboundEvent>,
) -> Result<Json<EventResponse>, ErrorResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let kind = event.kind();
    let start = Instant::now();

    let result = state.deliver(event).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(requests) => {
            record_dispatch(kind, requests.len(), latency_ms, true);
            Ok(Json(EventResponse {
                correlation_id,
                requests,
            }))
        }
        Err(e) => {
            record_dispatch(kind, 0, latency_ms, false);
            Err(ErrorResponse::new("DISPATCH_FAILED", e.to_string())
                .with_correlation_id(correlation_id))
        }
    }
}

/// One picker page of the current catalog.
async fn catalog_handler(
    State(state): State<ServiceState>,
    Query(query): Query<CatalogQuery>,
) -> Json<PickerPage> {
    let page_size = state.router.config().page_size;
    Json(state.router.stores().page(query.page, page_size))
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<ServiceState>) -> Json<HealthResponse> {
    let stores = state.router.stores();
    let snapshot = stores.snapshot();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_size: snapshot.catalog.len(),
        approvers: snapshot.approvers.len(),
        sessions: state.router.sessions().len(),
        fingerprint: snapshot.fingerprint(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Liveness probe endpoint.
///
/// Simple check that the service is running.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the composer service.
pub fn create_router(state: ServiceState) -> Router {
    Router::new()
        .route("/api/events", post(events_handler))
        .route("/api/catalog", get(catalog_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposerConfig;
    use crate::router::Router as Composer;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(ServiceState::new(Composer::from_config(ComposerConfig::default())))
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_event_returns_requests() {
        let event = serde_json::json!({
            "type": "plain_text",
            "sender": { "id": 7, "handle": "ann" },
            "chat": 7,
            "text": "hello"
        });
        let request = Request::post("/api/events")
            .header("content-type", "application/json")
            .body(Body::from(event.to_string()))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: EventResponse = body_json(response).await;
        assert_eq!(body.requests.len(), 1);
        match &body.requests[0] {
            OutboundRequest::SendMessage { view, .. } => assert!(view.body.starts_with("hello ")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_catalog_page_is_clamped() {
        let request = Request::get("/api/catalog?page=9").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page: PickerPage = body_json(response).await;
        assert_eq!(page.page, 0);
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_liveness() {
        let request = Request::get("/health/live").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
