//! Parsing of the model's JSON replies into typed results.
//!
//! Strict about the envelope (the reply must be one JSON object), permissive
//! about field shapes: missing fields take defaults and free-text fields that
//! arrive as lists or objects are flattened to text.

use crate::error::AnalysisError;
use crate::models::{FreeValue, NutritionEstimate};
use std::collections::BTreeMap;

/// The object a model reply decodes to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelObject(BTreeMap<String, FreeValue>);

impl ModelObject {
    fn value(&self, key: &str) -> Option<&FreeValue> {
        self.0.get(key)
    }

    /// Field as display text; empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.value(key).map(FreeValue::to_text).unwrap_or_default()
    }

    /// Field as a list of non-blank strings; a scalar becomes a one-item list.
    pub fn text_list(&self, key: &str) -> Vec<String> {
        self.value(key)
            .map(FreeValue::to_text_list)
            .unwrap_or_default()
    }

    pub fn flag(&self, key: &str) -> bool {
        self.value(key).is_some_and(FreeValue::to_flag)
    }

    /// Non-negative number; anything unparseable or negative becomes 0.
    pub fn quantity(&self, key: &str) -> f64 {
        self.value(key)
            .and_then(FreeValue::to_number)
            .filter(|n| n.is_finite() && *n > 0.0)
            .unwrap_or(0.0)
    }

    fn object(&self, key: &str) -> ModelObject {
        match self.value(key) {
            Some(FreeValue::Map(map)) => ModelObject(map.clone()),
            _ => ModelObject::default(),
        }
    }
}

/// Decode the reply envelope. Anything but a JSON object is malformed output.
pub fn parse_object(text: &str) -> Result<ModelObject, AnalysisError> {
    let malformed = |reason: String| AnalysisError::MalformedModelOutput {
        raw: text.to_string(),
        reason,
    };

    match serde_json::from_str::<FreeValue>(strip_code_fence(text)) {
        Ok(FreeValue::Map(map)) => Ok(ModelObject(map)),
        Ok(_) => Err(malformed("expected a JSON object".to_string())),
        Err(e) => Err(malformed(e.to_string())),
    }
}

/// Some models wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// A typed result built from a decoded reply.
pub trait ModelOutput: Sized {
    fn from_object(object: &ModelObject) -> Self;
}

pub fn parse<T: ModelOutput>(text: &str) -> Result<T, AnalysisError> {
    parse_object(text).map(|object| T::from_object(&object))
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventAdvice {
    pub practices: Vec<String>,
    pub nutrition_suggestion: String,
    pub purpose: String,
}

impl ModelOutput for EventAdvice {
    fn from_object(object: &ModelObject) -> Self {
        Self {
            practices: object.text_list("practices"),
            nutrition_suggestion: object.text("nutritionSuggestion"),
            purpose: object.text("purpose"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealAnalysis {
    pub dish_name: String,
    pub ingredients: Vec<String>,
    pub nutrition: NutritionEstimate,
    pub health_advice: String,
    pub recommendation: String,
    pub allergies_detected: Vec<String>,
}

impl ModelOutput for MealAnalysis {
    fn from_object(object: &ModelObject) -> Self {
        let nutrition = object.object("nutrition");
        Self {
            dish_name: object.text("dishName"),
            ingredients: object.text_list("ingredients"),
            nutrition: NutritionEstimate {
                calories: nutrition.quantity("calories"),
                proteins: nutrition.quantity("proteins"),
                carbs: nutrition.quantity("carbs"),
                fats: nutrition.quantity("fats"),
                fibers: nutrition.quantity("fibers"),
            },
            health_advice: object.text("healthAdvice"),
            recommendation: object.text("recommendation"),
            allergies_detected: object.text_list("allergiesDetected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyAdvice {
    pub global_advice: String,
    pub recommendations: String,
    pub needs_met: bool,
}

impl ModelOutput for DailyAdvice {
    fn from_object(object: &ModelObject) -> Self {
        Self {
            global_advice: object.text("globalAdvice"),
            recommendations: object.text("recommendations"),
            needs_met: object.flag("needsMet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthAdvice {
    pub summary: String,
    pub action: String,
    pub breakfast_suggestion: String,
    pub indicator_to_watch: String,
    pub sleep_remark: String,
    pub sleep_practices: String,
}

impl ModelOutput for HealthAdvice {
    fn from_object(object: &ModelObject) -> Self {
        Self {
            summary: object.text("summary"),
            action: object.text("action"),
            breakfast_suggestion: object.text("breakfastSuggestion"),
            indicator_to_watch: object.text("indicatorToWatch"),
            sleep_remark: object.text("sleepRemark"),
            sleep_practices: object.text("sleepPractices"),
        }
    }
}

/// Result shapes, one per structured analysis kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Event,
    Meal,
    Daily,
    Health,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Event(EventAdvice),
    Meal(MealAnalysis),
    Daily(DailyAdvice),
    Health(HealthAdvice),
}

pub fn parse_analysis(text: &str, kind: ResultKind) -> Result<AnalysisResult, AnalysisError> {
    let object = parse_object(text)?;
    Ok(match kind {
        ResultKind::Event => AnalysisResult::Event(EventAdvice::from_object(&object)),
        ResultKind::Meal => AnalysisResult::Meal(MealAnalysis::from_object(&object)),
        ResultKind::Daily => AnalysisResult::Daily(DailyAdvice::from_object(&object)),
        ResultKind::Health => AnalysisResult::Health(HealthAdvice::from_object(&object)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncated_json_is_malformed_and_keeps_raw_text() {
        let raw = r#"{"globalAdvice": "Eat more fib"#;

        let err = parse::<DailyAdvice>(raw).unwrap_err();

        match err {
            AnalysisError::MalformedModelOutput { raw: kept, .. } => assert_eq!(kept, raw),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        for raw in ["[1, 2]", "\"just text\"", "42", "", "Sure! Here is your analysis."] {
            assert!(
                matches!(
                    parse_object(raw),
                    Err(AnalysisError::MalformedModelOutput { .. })
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_code_fenced_object_is_accepted() {
        let advice: DailyAdvice =
            parse("```json\n{\"globalAdvice\": \"ok\", \"needsMet\": true}\n```").unwrap();
        assert_eq!(advice.global_advice, "ok");
        assert!(advice.needs_met);
    }

    #[test]
    fn test_needs_met_coercion() {
        let cases = [
            (json!("Yes"), true),
            (json!("TRUE"), true),
            (json!("1"), true),
            (json!("oui"), true),
            (json!(true), true),
            (json!("no"), false),
            (json!("0"), false),
            (json!(false), false),
            (json!(null), false),
        ];
        for (value, expected) in cases {
            let text = json!({ "needsMet": value }).to_string();
            assert_eq!(parse::<DailyAdvice>(&text).unwrap().needs_met, expected, "{text}");
        }

        assert!(!parse::<DailyAdvice>("{}").unwrap().needs_met);
    }

    #[test]
    fn test_missing_fields_default() {
        let health: HealthAdvice = parse("{}").unwrap();
        assert_eq!(health.summary, "");
        assert_eq!(health.sleep_practices, "");

        let event: EventAdvice = parse(r#"{"purpose": "Align on Q3"}"#).unwrap();
        assert!(event.practices.is_empty());
        assert_eq!(event.nutrition_suggestion, "");
        assert_eq!(event.purpose, "Align on Q3");
    }

    #[test]
    fn test_free_text_shapes_are_flattened() {
        let text = json!({
            "summary": ["Good", "day"],
            "action": {"walk": "20 min"},
            "sleepPractices": 3
        })
        .to_string();

        let health: HealthAdvice = parse(&text).unwrap();

        assert_eq!(health.summary, "Good day");
        assert_eq!(health.action, r#"{"walk":"20 min"}"#);
        assert_eq!(health.sleep_practices, "3");
    }

    #[test]
    fn test_meal_nutrition_is_coerced_non_negative() {
        let text = json!({
            "dishName": "Lablabi",
            "ingredients": ["chickpeas", "cumin", "bread"],
            "nutrition": {"calories": "520", "proteins": -3, "carbs": 70.5, "fats": "n/a"},
            "allergiesDetected": "gluten"
        })
        .to_string();

        let meal: MealAnalysis = parse(&text).unwrap();

        assert_eq!(meal.nutrition.calories, 520.0);
        assert_eq!(meal.nutrition.proteins, 0.0);
        assert_eq!(meal.nutrition.carbs, 70.5);
        assert_eq!(meal.nutrition.fats, 0.0);
        assert_eq!(meal.nutrition.fibers, 0.0);
        assert!(meal.nutrition.is_non_negative());
        assert_eq!(meal.allergies_detected, vec!["gluten"]);
    }

    #[test]
    fn test_complete_reply_parses_without_loss() {
        let text = json!({
            "summary": "Balanced day with solid recovery.",
            "action": "Take a 20 minute walk after lunch.",
            "breakfastSuggestion": "Greek yogurt with oats and berries.",
            "indicatorToWatch": "HRV",
            "sleepRemark": "Your sleep quality was good. Let's start a day with a protein breakfast 💪",
            "sleepPractices": "- Keep a regular bedtime\n- Limit screens after 21:00"
        })
        .to_string();

        let parsed = parse_analysis(&text, ResultKind::Health).unwrap();

        assert_eq!(
            parsed,
            AnalysisResult::Health(HealthAdvice {
                summary: "Balanced day with solid recovery.".to_string(),
                action: "Take a 20 minute walk after lunch.".to_string(),
                breakfast_suggestion: "Greek yogurt with oats and berries.".to_string(),
                indicator_to_watch: "HRV".to_string(),
                sleep_remark:
                    "Your sleep quality was good. Let's start a day with a protein breakfast 💪"
                        .to_string(),
                sleep_practices: "- Keep a regular bedtime\n- Limit screens after 21:00"
                    .to_string(),
            })
        );
    }

    #[test]
    fn test_event_practices_keep_order() {
        let text = json!({
            "practices": ["Breathe for two minutes", "Review the agenda", "Drink water"],
            "nutritionSuggestion": "A banana",
            "purpose": "Decide the roadmap"
        })
        .to_string();

        let AnalysisResult::Event(event) = parse_analysis(&text, ResultKind::Event).unwrap() else {
            panic!("expected event result");
        };

        assert_eq!(
            event.practices,
            vec!["Breathe for two minutes", "Review the agenda", "Drink water"]
        );
    }
}
