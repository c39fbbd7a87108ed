//! Liveness, readiness and metrics endpoints mounted by every service.

use crate::observability::render_metrics;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

/// `/health`, `/ready` and `/metrics` for the named service.
pub fn health_routes<S>(service_name: &'static str, version: &'static str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/health",
            get(move || async move {
                (
                    StatusCode::OK,
                    Json(json!({
                        "status": "ok",
                        "service": service_name,
                        "version": version,
                    })),
                )
            }),
        )
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
}

async fn readiness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        render_metrics(),
    )
}
