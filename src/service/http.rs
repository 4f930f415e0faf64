//! HTTP surface: queue API, health probes and Prometheus metrics
//!
//! Every handler goes through the shared `BoxOffice`, so concurrent clients
//! see one consistent line.

use crate::error::QueueError;
use crate::metrics::MetricsCollector;
use crate::service::app::AppState;
use crate::service::box_office::BoxOffice;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::EntryId;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub box_office: Arc<BoxOffice>,
    pub metrics_collector: Arc<MetricsCollector>,
    pub app_state: Option<Arc<AppState>>,
}

impl HttpState {
    pub fn new(
        box_office: Arc<BoxOffice>,
        metrics_collector: Arc<MetricsCollector>,
        app_state: Option<Arc<AppState>>,
    ) -> Self {
        Self {
            box_office,
            metrics_collector,
            app_state,
        }
    }
}

/// Body of a join request
#[derive(Debug, Default, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub vip: bool,
}

/// Query parameters of the history endpoint
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Maps queue errors onto HTTP responses
pub struct ApiError(QueueError);

impl From<QueueError> for ApiError {
    fn from(error: QueueError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            QueueError::EmptyQueue => StatusCode::CONFLICT,
            QueueError::PersistenceFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Router builder for the service
pub struct HttpServer;

impl HttpServer {
    /// Create the Axum router with all endpoints
    pub fn router(state: HttpState) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/queue", get(queue_view_handler).post(join_handler))
            .route("/queue/serve", post(serve_handler))
            .route("/queue/next", get(peek_handler))
            .route("/queue/{id}/position", get(position_handler))
            .route("/history", get(history_handler))
            .route("/reset", post(reset_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .with_state(state)
    }
}

/// Root endpoint handler - shows service information
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "cinema-queue",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /queue",
            "GET /queue",
            "POST /queue/serve",
            "GET /queue/next",
            "GET /queue/{id}/position",
            "GET /history",
            "POST /reset",
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats"
        ]
    }))
}

async fn join_handler(
    State(state): State<HttpState>,
    request: Option<Json<JoinRequest>>,
) -> impl IntoResponse {
    // No body means a regular customer
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let ticket = state.box_office.join(request.vip).await;
    (StatusCode::CREATED, Json(ticket))
}

async fn serve_handler(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.box_office.serve_next().await?;
    Ok(Json(outcome))
}

async fn queue_view_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(state.box_office.view().await)
}

async fn peek_handler(State(state): State<HttpState>) -> Response {
    match state.box_office.peek_next().await {
        Some(ticket) => Json(ticket).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn position_handler(
    State(state): State<HttpState>,
    Path(id): Path<EntryId>,
) -> Response {
    match state.box_office.position_of(id).await {
        Some(position) => Json(json!({ "id": id, "position": position })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("ticket #{} is not waiting", id) })),
        )
            .into_response(),
    }
}

async fn history_handler(
    State(state): State<HttpState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(state.box_office.history(query.limit).await)
}

async fn reset_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let session_id = state.box_office.reset().await;
    Json(json!({ "session_id": session_id }))
}

fn status_body(status: &str) -> Json<serde_json::Value> {
    Json(json!({
        "status": status,
        "service": "cinema-queue",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<HttpState>) -> impl IntoResponse {
    debug!("Health check requested");

    match &state.app_state {
        Some(app_state) => match HealthCheck::liveness_check(app_state.clone()).await {
            Ok(HealthStatus::Healthy) => (StatusCode::OK, status_body("healthy")),
            Ok(HealthStatus::Degraded) => (StatusCode::OK, status_body("degraded")),
            Ok(HealthStatus::Unhealthy) | Err(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, status_body("unhealthy"))
            }
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, status_body("unhealthy")),
    }
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<HttpState>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match &state.app_state {
        Some(app_state) => match HealthCheck::readiness_check(app_state.clone()).await {
            Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
            Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
            Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
            Err(e) => {
                error!("Readiness check failed: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
            }
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<HttpState>) -> impl IntoResponse {
    match &state.app_state {
        Some(app_state) => match HealthCheck::liveness_check(app_state.clone()).await {
            Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
            _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<HttpState>) -> Response {
    let metric_families = state.metrics_collector.registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            metrics_output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Detailed statistics endpoint handler
async fn stats_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let stats = state.box_office.stats().await;
    let status = match &state.app_state {
        Some(app_state) => HealthCheck::liveness_check(app_state.clone())
            .await
            .unwrap_or(HealthStatus::Unhealthy),
        None => HealthStatus::Unhealthy,
    };

    Json(json!({
        "service": {
            "name": "cinema-queue",
            "version": env!("CARGO_PKG_VERSION"),
            "status": status,
        },
        "session": {
            "id": stats.session_id,
            "started_at": stats.session_started_at,
        },
        "queue": stats.queue,
        "timestamp": chrono::Utc::now()
    }))
}
