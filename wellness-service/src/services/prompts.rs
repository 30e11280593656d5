//! Prompt templates, one per analysis kind.
//!
//! Builders are pure: the same request always yields the same prompt text.

use crate::config::ModelConfig;
use crate::models::{MealRecord, MealType, ModelMessage, NutritionEstimate, SleepRecord, UserProfile};
use crate::services::analyzer::MetricsReport;
use crate::services::providers::CompletionOptions;
use chrono::{NaiveDateTime, Timelike};

/// The closed set of analyses the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Event,
    Meal,
    Daily,
    Health,
    Coach,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Event => "event",
            AnalysisKind::Meal => "meal",
            AnalysisKind::Daily => "daily",
            AnalysisKind::Health => "health",
            AnalysisKind::Coach => "coach",
        }
    }

    /// Generation settings for this kind. Everything but the coach asks for a JSON object.
    pub fn options(&self, models: &ModelConfig) -> CompletionOptions {
        match self {
            AnalysisKind::Event | AnalysisKind::Meal => {
                CompletionOptions::new(&models.analysis_model)
                    .temperature(0.1)
                    .json()
            }
            AnalysisKind::Daily => CompletionOptions::new(&models.analysis_model)
                .temperature(0.2)
                .json(),
            AnalysisKind::Health => CompletionOptions::new(&models.analysis_model)
                .temperature(0.3)
                .max_tokens(400)
                .json(),
            AnalysisKind::Coach => CompletionOptions::new(&models.coach_model)
                .temperature(0.7)
                .max_tokens(500),
        }
    }
}

/// Daily reference intake used by the daily summary.
pub const DAILY_TARGETS: NutritionEstimate = NutritionEstimate {
    calories: 2000.0,
    proteins: 60.0,
    carbs: 250.0,
    fats: 70.0,
    fibers: 30.0,
};

/// Meal suggestion for an event starting at `hour` (0-23): `(meal, examples)`.
pub fn meal_for_hour(hour: u32) -> (&'static str, &'static str) {
    match hour {
        0..=11 => ("nutritious breakfast", "eggs, oatmeal, fresh fruits, yogurt"),
        12..=13 => ("balanced lunch", "lean protein, whole grains, vegetables"),
        14..=16 => ("light snack", "yogurt, fruit, nuts, energy bar"),
        _ => ("light evening snack", "calming tea, whole grain biscuit"),
    }
}

/// `HH:MM - HH:MM` on the wall clock of each bound.
pub fn event_window(start: &NaiveDateTime, end: &NaiveDateTime) -> String {
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

pub fn event_prompt(
    title: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    duration_minutes: i64,
) -> String {
    let (meal, examples) = meal_for_hour(start.hour());

    format!(
        r#"Calendar Event: {title}
Time: {window} ({duration_minutes} minutes)

Generate a JSON response with:
1. "practices": 2-3 short quick professional sentences with practical tips to reduce stress and improve focus before this event
2. "nutritionSuggestion": a quick suggestion for {meal} ({examples}) to optimize energy
3. "purpose": the main objective in one sentence

Be concise and professional.
Return ONLY a strict JSON object with the fields "practices" (array of strings), "nutritionSuggestion" and "purpose", without extra text."#,
        window = event_window(start, end),
    )
}

pub fn meal_prompt(profile: &UserProfile, meal_type: Option<MealType>) -> String {
    let mut prompt = format!(
        r#"You are a professional AI dietitian specialized in Mediterranean, Tunisian, and French cuisine.
Analyze the provided meal image and respond strictly in professional English with clear, accurate, and coherent output.

**User Profile**:
- Gender: {gender}
- Weight: {weight} kg
- Height: {height} cm
- Goal: {goal}
"#,
        gender = profile.field("gender"),
        weight = profile.field("weight"),
        height = profile.field("height"),
        goal = profile.field("goal"),
    );

    let allergies = profile.allergies();
    if !allergies.is_empty() {
        prompt.push_str(&format!("- Known allergies: {}\n", allergies.join(", ")));
    }
    if let Some(meal_type) = meal_type {
        prompt.push_str(&format!("- Meal type: {}\n", meal_type.label()));
    }

    prompt.push_str(
        r#"
**Task**:
1. Identify the dish name in English (exact Tunisian name if applicable, otherwise a description, all in English)
2. List main ingredients
3. Estimate macronutrients (typical portions)
4. Provide personalized health advice based on user profile
5. Suggest possible improvements or adjustments
6. Detect if any of the user's known allergies are present. If yes, list them clearly in `allergiesDetected`.

**IMPORTANT**: Return ONLY a strict JSON object without extra text:

{
    "dishName": "Dish name",
    "ingredients": ["ingredient1", "ingredient2"],
    "nutrition": {
        "calories": 0,
        "proteins": 0,
        "carbs": 0,
        "fats": 0,
        "fibers": 0
    },
    "healthAdvice": "Personalized health advice",
    "recommendation": "Suggested adjustments",
    "allergiesDetected": ["allergen1", "allergen2"]
}
"#,
    );
    prompt
}

pub fn daily_prompt(meals: &[MealRecord], totals: &NutritionEstimate) -> String {
    let meals_summary = meals
        .iter()
        .map(|meal| {
            format!(
                "- {}: {} ({:.0} kcal)",
                meal.meal_type, meal.dish_name, meal.nutrition.calories
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a professional AI nutritionist.
Analyze the following daily meals and provide a detailed nutritional summary in professional English.
**Daily Meals**:
{meals_summary}

**Total Nutrition**:
- Calories: {:.0} kcal
- Proteins: {:.1}g
- Carbs: {:.1}g
- Fats: {:.1}g
- Fibers: {:.1}g

**Recommended Daily Targets**:
- Calories: {:.0} kcal
- Proteins: {:.0}g
- Carbs: {:.0}g
- Fats: {:.0}g
- Fibers: {:.0}g

Return ONLY a strict JSON object:

{{
    "globalAdvice": "Detailed nutritional summary",
    "recommendations": "Recommendations to improve balance",
    "needsMet": true/false
}}
"#,
        totals.calories,
        totals.proteins,
        totals.carbs,
        totals.fats,
        totals.fibers,
        DAILY_TARGETS.calories,
        DAILY_TARGETS.proteins,
        DAILY_TARGETS.carbs,
        DAILY_TARGETS.fats,
        DAILY_TARGETS.fibers,
    )
}

/// Plain-language verdict on a night of sleep. First matching band wins.
pub fn sleep_quality_descriptor(sleep: &SleepRecord) -> &'static str {
    let score = sleep.quality_score;
    let duration = sleep.duration_hours;

    if score >= 85.0 && duration >= 7.0 {
        "excellent and restful"
    } else if score >= 70.0 {
        "good"
    } else if score >= 50.0 {
        if duration >= 6.0 {
            "fair, possibly light"
        } else {
            "short and likely interrupted"
        }
    } else if duration >= 5.0 {
        "poor and likely fitful"
    } else {
        "very poor and short"
    }
}

const SLEEP_NOT_RECORDED: &str = "not recorded";

pub fn health_prompt(
    profile: &UserProfile,
    report: &MetricsReport,
    sleep: Option<&SleepRecord>,
) -> String {
    let stats = &report.stats;

    let sleep_info = sleep
        .map(|s| {
            format!(
                "\nSleep last night:\n- Duration: {:.1}h\n- Quality score: {:.0}/100\n- Deep sleep: {} min\n- REM sleep: {} min\n",
                s.duration_hours, s.quality_score, s.deep_sleep_minutes, s.rem_sleep_minutes
            )
        })
        .unwrap_or_default();
    let descriptor = sleep
        .map(sleep_quality_descriptor)
        .unwrap_or(SLEEP_NOT_RECORDED);

    let alerts_text = if report.alerts.is_empty() {
        "No critical alerts".to_string()
    } else {
        report
            .alerts
            .iter()
            .map(|alert| format!("- {}", alert))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let spo2 = stats
        .avg_spo2
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "Not available".to_string());

    format!(
        r#"You are a health AI coach. Analyze this user's daily health data and provide brief, actionable advice.

**User Profile:**
- Gender: {gender}
- Weight: {weight} kg
- Goal: {goal}

**Today's Data (24h):**
{sleep_info}
- Resting HR: {resting:.0} bpm
- HRV median: {hrv:.0} ms
- Total steps: {steps}
- Calories burned: {calories:.0} kcal
- Active time: {active} min
- Blood oxygen (SpO2): {spo2}
- Estimated stress: {stress:.1}/10

**Alerts:**
{alerts_text}

Provide a brief analysis. Return ONLY a strict JSON object without extra text:

{{
    "summary": "One sentence describing today's health state",
    "action": "One concrete action to take today",
    "breakfastSuggestion": "Brief breakfast recommendation based on data",
    "indicatorToWatch": "Which metric to monitor (HR, HRV, steps, etc.)",
    "sleepRemark": "A short, encouraging sentence for the sleep card, in the format: 'Your sleep quality was {descriptor}. Let's start a day with a ... breakfast 💪'.",
    "sleepPractices": "If sleep was poor or decent, provide 2-3 bullet-pointed tips to improve it. If sleep was excellent, provide a brief encouraging message about maintaining good habits. Use \n for new lines."
}}
"#,
        gender = profile.field("gender"),
        weight = profile.field("weight"),
        goal = profile.field_or("goal", "General health"),
        resting = stats.avg_resting_hr,
        hrv = stats.median_hrv,
        steps = group_thousands(stats.total_steps),
        calories = stats.total_calories,
        active = stats.total_active_minutes,
        stress = stats.stress_level,
    )
}

fn coach_system_prompt(profile: &UserProfile) -> String {
    format!(
        r#"You are a professional AI health coach.
Analyze the user's health and lifestyle data and provide clear, concise, and professional guidance in English.

User Profile:
- Gender: {gender}
- Weight: {weight} kg
- Height: {height} cm
- Goal: {goal}

Your role:
- Provide personalized nutrition and lifestyle advice and encouragement
- Answer questions about healthy eating, Tunisian cuisine, Mediterranean diet and fitness
- Be positive, warm, supportive, and motivating
- Keep responses concise (2-3 sentences unless more detail is needed)
- Use simple, friendly English

Guidelines:
- Focus on sustainable, healthy habits
- Respect cultural food preferences
- Encourage balanced Mediterranean diet principles
- Be positive and non-judgmental
"#,
        gender = profile.field("gender"),
        weight = profile.field("weight"),
        height = profile.field("height"),
        goal = profile.field_or("goal", "General wellness"),
    )
}

/// System persona, then the prior turns unchanged, then the new user message.
pub fn coach_messages(
    profile: &UserProfile,
    history: &[ModelMessage],
    message: &str,
) -> Vec<ModelMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ModelMessage::system(coach_system_prompt(profile)));
    messages.extend(history.iter().cloned());
    messages.push(ModelMessage::user(message));
    messages
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::analyzer::HealthStats;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sleep(quality_score: f64, duration_hours: f64) -> SleepRecord {
        SleepRecord {
            duration_hours,
            quality_score,
            deep_sleep_minutes: 60,
            rem_sleep_minutes: 80,
            light_sleep_minutes: 200,
        }
    }

    fn models() -> ModelConfig {
        ModelConfig {
            analysis_model: "vision-model".to_string(),
            coach_model: "chat-model".to_string(),
        }
    }

    #[test]
    fn test_meal_bands_by_start_hour() {
        assert_eq!(meal_for_hour(0).0, "nutritious breakfast");
        assert_eq!(meal_for_hour(11).0, "nutritious breakfast");
        assert_eq!(meal_for_hour(12).0, "balanced lunch");
        assert_eq!(meal_for_hour(13).0, "balanced lunch");
        assert_eq!(meal_for_hour(14).0, "light snack");
        assert_eq!(meal_for_hour(16).0, "light snack");
        assert_eq!(meal_for_hour(17).0, "light evening snack");
        assert_eq!(meal_for_hour(23).0, "light evening snack");
    }

    #[test]
    fn test_event_prompt_interpolates_window_and_meal() {
        let prompt = event_prompt("Board review", &at(13, 30), &at(15, 0), 90);

        assert!(prompt.contains("Calendar Event: Board review"));
        assert!(prompt.contains("Time: 13:30 - 15:00 (90 minutes)"));
        assert!(prompt.contains("balanced lunch (lean protein, whole grains, vegetables)"));
        assert!(prompt.trim_end().ends_with("without extra text."));
    }

    #[test]
    fn test_sleep_descriptor_table() {
        let cases = [
            (90.0, 8.0, "excellent and restful"),
            (90.0, 6.5, "good"),
            (70.0, 4.0, "good"),
            (60.0, 6.0, "fair, possibly light"),
            (50.0, 5.9, "short and likely interrupted"),
            (40.0, 5.0, "poor and likely fitful"),
            (40.0, 4.9, "very poor and short"),
        ];
        for (score, duration, expected) in cases {
            assert_eq!(
                sleep_quality_descriptor(&sleep(score, duration)),
                expected,
                "score {score}, duration {duration}"
            );
        }
    }

    #[test]
    fn test_health_prompt_embeds_descriptor_and_alerts() {
        let report = MetricsReport {
            stats: HealthStats {
                median_hrv: 48.0,
                avg_resting_hr: 61.4,
                avg_spo2: None,
                total_steps: 12345,
                total_calories: 2100.0,
                total_active_minutes: 45,
                stress_level: 10.0,
            },
            alerts: vec!["Sleep duration low: 5.5h (recommended: 7-9h)".to_string()],
        };
        let night = sleep(55.0, 5.5);

        let prompt = health_prompt(&UserProfile::default(), &report, Some(&night));

        assert!(prompt.contains("Your sleep quality was short and likely interrupted."));
        assert!(prompt.contains("- Sleep duration low: 5.5h"));
        assert!(prompt.contains("Total steps: 12,345"));
        assert!(prompt.contains("Blood oxygen (SpO2): Not available"));
        assert!(prompt.contains("Gender: Not specified"));
        assert!(prompt.contains("Goal: General health"));
        assert!(prompt.contains("\"sleepPractices\""));
    }

    #[test]
    fn test_meal_prompt_lists_allergies_and_meal_type() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"gender": "male", "allergies": ["peanuts", "shellfish"]}"#,
        )
        .unwrap();

        let prompt = meal_prompt(&profile, Some(MealType::Dinner));

        assert!(prompt.contains("- Gender: male"));
        assert!(prompt.contains("- Height: Not specified cm"));
        assert!(prompt.contains("- Known allergies: peanuts, shellfish"));
        assert!(prompt.contains("- Meal type: Dinner"));
        assert!(prompt.contains("\"allergiesDetected\""));

        let bare = meal_prompt(&UserProfile::default(), None);
        assert!(!bare.contains("Known allergies"));
        assert!(!bare.contains("Meal type"));
    }

    #[test]
    fn test_daily_prompt_lists_meals_and_targets() {
        let meal = MealRecord {
            user_id: "u1".to_string(),
            meal_type: MealType::Lunch,
            timestamp: "2024-05-01T12:30:00Z".to_string(),
            dish_name: "Couscous".to_string(),
            ingredients: vec!["semolina".to_string()],
            nutrition: NutritionEstimate {
                calories: 650.4,
                proteins: 30.0,
                carbs: 80.0,
                fats: 20.0,
                fibers: 8.0,
            },
            health_advice: String::new(),
            recommendation: String::new(),
            allergies_detected: vec![],
        };

        let prompt = daily_prompt(std::slice::from_ref(&meal), &meal.nutrition);

        assert!(prompt.contains("- lunch: Couscous (650 kcal)"));
        assert!(prompt.contains("- Proteins: 30.0g"));
        assert!(prompt.contains("- Calories: 2000 kcal"));
        assert!(prompt.contains("- Fibers: 30g"));
        assert!(prompt.contains("\"needsMet\""));
    }

    #[test]
    fn test_coach_messages_wrap_history() {
        let history = vec![
            ModelMessage::user("Hi"),
            ModelMessage {
                role: Role::Assistant,
                content: crate::models::MessageContent::Text("Hello!".to_string()),
            },
        ];

        let messages = coach_messages(&UserProfile::default(), &history, "What should I eat?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].text().contains("Goal: General wellness"));
        assert_eq!(messages[1..3], history[..]);
        assert_eq!(messages[3], ModelMessage::user("What should I eat?"));
    }

    #[test]
    fn test_options_per_kind() {
        let models = models();

        let health = AnalysisKind::Health.options(&models);
        assert_eq!(health.model, "vision-model");
        assert_eq!(health.temperature, Some(0.3));
        assert_eq!(health.max_tokens, Some(400));
        assert!(health.json_response);

        let coach = AnalysisKind::Coach.options(&models);
        assert_eq!(coach.model, "chat-model");
        assert_eq!(coach.temperature, Some(0.7));
        assert_eq!(coach.max_tokens, Some(500));
        assert!(!coach.json_response);

        assert_eq!(AnalysisKind::Daily.options(&models).temperature, Some(0.2));
        assert_eq!(AnalysisKind::Event.options(&models).temperature, Some(0.1));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
