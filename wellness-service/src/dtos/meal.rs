use crate::models::{MealType, NutritionEstimate, UserProfile};
use crate::services::response::MealAnalysis;
use serde::Serialize;

/// The decoded multipart form of a meal upload.
#[derive(Debug, Clone)]
pub struct MealUpload {
    pub user_id: String,
    pub meal_type: Option<MealType>,
    pub user_profile: UserProfile,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealAnalysisResponse {
    pub dish_name: String,
    pub ingredients: Vec<String>,
    pub nutrition: NutritionEstimate,
    pub health_advice: String,
    pub recommendation: String,
    pub allergies_detected: Vec<String>,
}

impl From<MealAnalysis> for MealAnalysisResponse {
    fn from(meal: MealAnalysis) -> Self {
        Self {
            dish_name: meal.dish_name,
            ingredients: meal.ingredients,
            nutrition: meal.nutrition,
            health_advice: meal.health_advice,
            recommendation: meal.recommendation,
            allergies_detected: meal.allergies_detected,
        }
    }
}
