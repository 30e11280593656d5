use super::reject;
use crate::dtos::{HealthAnalysisRequest, HealthAnalysisResponse};
use crate::startup::AppState;
use axum::{extract::State, routing::post, Json, Router};
use service_core::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new().route("/analyze-health", post(analyze_health))
}

pub async fn analyze_health(
    State(state): State<AppState>,
    Json(request): Json<HealthAnalysisRequest>,
) -> Result<Json<HealthAnalysisResponse>, AppError> {
    tracing::info!(
        user_id = %request.user_id,
        date = %request.date,
        samples = request.metrics.len(),
        has_sleep = request.sleep_data.is_some(),
        "Analyzing health metrics"
    );

    let analysis = state
        .analysis
        .health(request)
        .await
        .map_err(|e| reject("health", e))?;

    Ok(Json(analysis))
}
