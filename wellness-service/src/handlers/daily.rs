use super::reject;
use crate::dtos::{DailyAnalysisRequest, DailySummaryResponse};
use crate::startup::AppState;
use axum::{extract::State, routing::post, Json, Router};
use service_core::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new().route("/analyze-daily", post(analyze_daily))
}

pub async fn analyze_daily(
    State(state): State<AppState>,
    Json(request): Json<DailyAnalysisRequest>,
) -> Result<Json<DailySummaryResponse>, AppError> {
    tracing::info!(
        user_id = %request.user_id,
        date = %request.date,
        meals = request.meals.len(),
        "Analyzing daily meals"
    );

    let summary = state
        .analysis
        .daily(request)
        .await
        .map_err(|e| reject("daily", e))?;

    Ok(Json(summary))
}
