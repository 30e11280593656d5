//! Request pipelines for the five analysis kinds.
//!
//! Each request runs once through validate, analyze (health only), prompt,
//! model call and parse. Nothing is retried here.

use crate::config::{ImageConfig, ModelConfig};
use crate::dtos::{
    CoachRequest, DailyAnalysisRequest, DailyStats, DailySummaryResponse,
    EventRecommendationResponse, EventRequest, HealthAnalysisRequest, HealthAnalysisResponse,
    MealAnalysisResponse, MealUpload,
};
use crate::error::AnalysisError;
use crate::models::{ModelMessage, NutritionEstimate};
use crate::services::analyzer;
use crate::services::image::{compress_image_blocking, jpeg_data_url};
use crate::services::metrics::record_model_call;
use crate::services::prompts::{self, AnalysisKind};
use crate::services::providers::{ChatProvider, ChatStream};
use crate::services::response::{self, DailyAdvice, EventAdvice, HealthAdvice, MealAnalysis};
use std::sync::Arc;
use validator::Validate;

const PRACTICE_MARK: &str = "✔️ ";

#[derive(Clone)]
pub struct AnalysisService {
    provider: Arc<dyn ChatProvider>,
    models: ModelConfig,
    image: ImageConfig,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn ChatProvider>, models: ModelConfig, image: ImageConfig) -> Self {
        Self {
            provider,
            models,
            image,
        }
    }

    pub async fn event(
        &self,
        request: EventRequest,
    ) -> Result<EventRecommendationResponse, AnalysisError> {
        request.validate()?;
        let window = request.window()?;

        let prompt = prompts::event_prompt(
            &request.event_title,
            &window.start,
            &window.end,
            window.duration_minutes,
        );
        let text = self
            .complete(AnalysisKind::Event, vec![ModelMessage::user(prompt)])
            .await?;
        let advice: EventAdvice = self.parse(AnalysisKind::Event, &text)?;

        Ok(EventRecommendationResponse {
            event_time: prompts::event_window(&window.start, &window.end),
            event_title: request.event_title,
            practices: advice
                .practices
                .iter()
                .map(|practice| format!("{}{}", PRACTICE_MARK, practice))
                .collect::<Vec<_>>()
                .join("\n"),
            nutrition_suggestion: advice.nutrition_suggestion,
            purpose: advice.purpose,
        })
    }

    pub async fn meal(&self, upload: MealUpload) -> Result<MealAnalysisResponse, AnalysisError> {
        if upload.user_id.trim().is_empty() {
            return Err(AnalysisError::Validation("userId is required".to_string()));
        }
        if upload.image.is_empty() {
            return Err(AnalysisError::Validation(
                "A non-empty meal image is required".to_string(),
            ));
        }

        let image = compress_image_blocking(upload.image, self.image.clone()).await?;
        let prompt = prompts::meal_prompt(&upload.user_profile, upload.meal_type);
        let message = ModelMessage::user_with_image(prompt, jpeg_data_url(&image));

        let text = self.complete(AnalysisKind::Meal, vec![message]).await?;
        let meal: MealAnalysis = self.parse(AnalysisKind::Meal, &text)?;

        Ok(meal.into())
    }

    pub async fn daily(
        &self,
        request: DailyAnalysisRequest,
    ) -> Result<DailySummaryResponse, AnalysisError> {
        request.validate()?;
        if let Some(meal) = request
            .meals
            .iter()
            .find(|meal| !meal.nutrition.is_non_negative())
        {
            return Err(AnalysisError::Validation(format!(
                "Nutrition values must be non-negative (meal '{}')",
                meal.dish_name
            )));
        }

        let totals: NutritionEstimate = request.meals.iter().map(|meal| &meal.nutrition).sum();
        let prompt = prompts::daily_prompt(&request.meals, &totals);

        let text = self
            .complete(AnalysisKind::Daily, vec![ModelMessage::user(prompt)])
            .await?;
        let advice: DailyAdvice = self.parse(AnalysisKind::Daily, &text)?;

        Ok(DailySummaryResponse {
            id: format!("{}_{}", request.user_id, request.date),
            meal_analysis_ids: request
                .meals
                .iter()
                .map(|meal| meal.timestamp.clone())
                .collect(),
            user_id: request.user_id,
            date: request.date,
            total_nutrition: totals,
            global_advice: advice.global_advice,
            recommendations: advice.recommendations,
            needs_met: advice.needs_met,
        })
    }

    pub async fn health(
        &self,
        request: HealthAnalysisRequest,
    ) -> Result<HealthAnalysisResponse, AnalysisError> {
        request.validate()?;
        let sleep = request.sleep_data.as_ref();
        let report = analyzer::analyze(&request.metrics, sleep)?;

        let profile = request.user_profile.clone().unwrap_or_default();
        let prompt = prompts::health_prompt(&profile, &report, sleep);

        let text = self
            .complete(AnalysisKind::Health, vec![ModelMessage::user(prompt)])
            .await?;
        let advice: HealthAdvice = self.parse(AnalysisKind::Health, &text)?;

        Ok(HealthAnalysisResponse {
            summary: advice.summary,
            action: advice.action,
            breakfast_suggestion: advice.breakfast_suggestion,
            indicator_to_watch: advice.indicator_to_watch,
            sleep_remark: advice.sleep_remark,
            sleep_practices: advice.sleep_practices,
            daily_stats: DailyStats::from(&report.stats),
            alerts: report.alerts,
        })
    }

    /// Open the coach conversation stream. Upstream failures arrive as the last item.
    pub async fn coach(&self, request: CoachRequest) -> Result<ChatStream, AnalysisError> {
        request.validate()?;
        if request.message.trim().is_empty() {
            return Err(AnalysisError::Validation("Message is required".to_string()));
        }

        let profile = request.user_profile.unwrap_or_default();
        let history = request.conversation_history.unwrap_or_default();
        let messages = prompts::coach_messages(&profile, &history, &request.message);
        let options = AnalysisKind::Coach.options(&self.models);

        tracing::info!(
            kind = AnalysisKind::Coach.as_str(),
            model = %options.model,
            history_len = history.len(),
            "Opening coach stream"
        );
        record_model_call(AnalysisKind::Coach.as_str(), "stream_opened");

        Ok(self.provider.stream(&messages, &options).await)
    }

    async fn complete(
        &self,
        kind: AnalysisKind,
        messages: Vec<ModelMessage>,
    ) -> Result<String, AnalysisError> {
        let options = kind.options(&self.models);

        match self.provider.complete(&messages, &options).await {
            Ok(text) => {
                record_model_call(kind.as_str(), "ok");
                tracing::debug!(kind = kind.as_str(), len = text.len(), "Model replied");
                Ok(text)
            }
            Err(e) => {
                let err = AnalysisError::from(e);
                record_model_call(kind.as_str(), err.kind());
                tracing::error!(kind = kind.as_str(), error = %err, "Model call failed");
                Err(err)
            }
        }
    }

    fn parse<T: response::ModelOutput>(
        &self,
        kind: AnalysisKind,
        text: &str,
    ) -> Result<T, AnalysisError> {
        response::parse(text).inspect_err(|err| {
            if let AnalysisError::MalformedModelOutput { raw, reason } = err {
                tracing::error!(
                    kind = kind.as_str(),
                    reason = %reason,
                    raw = %raw,
                    "Model returned malformed output"
                );
            }
        })
    }
}
