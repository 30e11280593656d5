use super::reject;
use crate::dtos::{EventRecommendationResponse, EventRequest};
use crate::startup::AppState;
use axum::{extract::State, routing::post, Json, Router};
use service_core::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new().route("/generate-event-recommendation", post(generate_event_recommendation))
}

pub async fn generate_event_recommendation(
    State(state): State<AppState>,
    Json(request): Json<EventRequest>,
) -> Result<Json<EventRecommendationResponse>, AppError> {
    tracing::info!(title = %request.event_title, "Generating event recommendation");

    let response = state
        .analysis
        .event(request)
        .await
        .map_err(|e| reject("event", e))?;

    Ok(Json(response))
}
