use super::reject;
use crate::dtos::{MealAnalysisResponse, MealUpload};
use crate::error::AnalysisError;
use crate::models::{MealType, UserProfile};
use crate::startup::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use service_core::error::AppError;

/// Upload cap for meal photos, before compression.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze-meal", post(analyze_meal))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub async fn analyze_meal(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MealAnalysisResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    tracing::info!(
        user_id = %upload.user_id,
        meal_type = ?upload.meal_type,
        image_size = upload.image.len(),
        "Analyzing meal image"
    );

    let analysis = state
        .analysis
        .meal(upload)
        .await
        .map_err(|e| reject("meal", e))?;

    Ok(Json(analysis))
}

/// Collect the form fields. Transport failures are bad requests; missing or
/// invalid fields are validation errors.
async fn read_upload(mut multipart: Multipart) -> Result<MealUpload, AppError> {
    let mut image = None;
    let mut user_id = None;
    let mut meal_type = None;
    let mut profile_text = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read image bytes: {}", e))
                })?;
                image = Some(bytes.to_vec());
            }
            "userId" | "mealType" | "userProfile" => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read field '{}': {}", name, e))
                })?;
                match name.as_str() {
                    "userId" => user_id = Some(text),
                    "mealType" => meal_type = Some(text),
                    _ => profile_text = Some(text),
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    build_upload(image, user_id, meal_type, profile_text).map_err(|e| reject("meal", e))
}

fn build_upload(
    image: Option<Vec<u8>>,
    user_id: Option<String>,
    meal_type: Option<String>,
    profile_text: Option<String>,
) -> Result<MealUpload, AnalysisError> {
    let image = image.ok_or_else(|| AnalysisError::Validation("image is required".to_string()))?;
    let user_id =
        user_id.ok_or_else(|| AnalysisError::Validation("userId is required".to_string()))?;

    let meal_type = meal_type
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.parse::<MealType>())
        .transpose()
        .map_err(AnalysisError::Validation)?;

    let user_profile = match profile_text.filter(|text| !text.trim().is_empty()) {
        Some(text) => serde_json::from_str::<UserProfile>(&text).map_err(|e| {
            AnalysisError::Validation(format!("userProfile must be a JSON object: {}", e))
        })?,
        None => UserProfile::default(),
    };

    Ok(MealUpload {
        user_id,
        meal_type,
        user_profile,
        image,
    })
}
