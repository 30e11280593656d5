use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
}

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "wellness-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe. A missing model credential is reported but does not fail
/// the probe; calls surface it individually.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let model_provider = if state.provider_configured {
        "configured"
    } else {
        "missing credentials"
    };

    Json(json!({
        "status": "ready",
        "modelProvider": model_provider
    }))
}

pub async fn metrics() -> impl IntoResponse {
    get_metrics()
}

/// Gateway listing of the analysis endpoints.
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Wellness analysis gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "event": "/generate-event-recommendation",
            "meal": "/analyze-meal",
            "daily": "/analyze-daily",
            "coach": "/coach",
            "health": "/analyze-health"
        }
    }))
}
