use crate::models::{MealRecord, NutritionEstimate};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalysisRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,
    pub meals: Vec<MealRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryResponse {
    /// `<userId>_<date>`
    pub id: String,
    pub user_id: String,
    pub date: String,
    /// Timestamps of the meals the summary covers.
    pub meal_analysis_ids: Vec<String>,
    pub total_nutrition: NutritionEstimate,
    pub global_advice: String,
    pub recommendations: String,
    pub needs_met: bool,
}
