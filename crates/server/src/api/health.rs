use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use medverify_pipeline::MetricsSnapshot;

use super::AppState;
use super::schemas::HealthResponse;

/// `GET /health` -- returns service status together with a metrics snapshot.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    description = "Returns service status, the active engine and a snapshot of pipeline counters.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "ok".into(),
        engine: state.pipeline.engine().name().into(),
        metrics: state.pipeline.metrics().snapshot(),
    };
    (StatusCode::OK, Json(body))
}

/// `GET /metrics` -- returns pipeline counters as JSON.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    summary = "Pipeline metrics",
    description = "Submitted, rejected, failed and completed instances plus per-verdict totals.",
    responses(
        (status = 200, description = "Current metric counters", body = MetricsSnapshot)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.pipeline.metrics().snapshot()))
}
