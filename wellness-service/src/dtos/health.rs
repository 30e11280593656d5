use crate::models::{HealthSample, SleepRecord, UserProfile};
use crate::services::analyzer::HealthStats;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnalysisRequest {
    pub user_id: String,
    pub date: String,
    pub metrics: Vec<HealthSample>,
    #[validate(nested)]
    pub sleep_data: Option<SleepRecord>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnalysisResponse {
    pub summary: String,
    pub action: String,
    pub breakfast_suggestion: String,
    pub indicator_to_watch: String,
    pub sleep_remark: String,
    pub sleep_practices: String,
    pub alerts: Vec<String>,
    pub daily_stats: DailyStats,
}

/// Locally computed statistics, rounded to one decimal for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    #[serde(rename = "avgRestingHR")]
    pub avg_resting_hr: f64,
    #[serde(rename = "medianHRV")]
    pub median_hrv: f64,
    #[serde(rename = "totalSteps")]
    pub total_steps: u64,
    #[serde(rename = "totalCalories")]
    pub total_calories: f64,
    #[serde(rename = "totalActiveMinutes")]
    pub total_active_minutes: u64,
    #[serde(rename = "avgSpO2")]
    pub avg_spo2: Option<f64>,
    #[serde(rename = "stressLevel")]
    pub stress_level: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl From<&HealthStats> for DailyStats {
    fn from(stats: &HealthStats) -> Self {
        Self {
            avg_resting_hr: round1(stats.avg_resting_hr),
            median_hrv: round1(stats.median_hrv),
            total_steps: stats.total_steps,
            total_calories: round1(stats.total_calories),
            total_active_minutes: stats.total_active_minutes,
            avg_spo2: stats.avg_spo2.map(round1),
            stress_level: round1(stats.stress_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_daily_stats_wire_names_and_rounding() {
        let stats = HealthStats {
            median_hrv: 48.0,
            avg_resting_hr: 61.666,
            avg_spo2: None,
            total_steps: 8000,
            total_calories: 1999.96,
            total_active_minutes: 42,
            stress_level: 2.6666,
        };

        let value = serde_json::to_value(DailyStats::from(&stats)).unwrap();

        assert_eq!(
            value,
            json!({
                "avgRestingHR": 61.7,
                "medianHRV": 48.0,
                "totalSteps": 8000,
                "totalCalories": 2000.0,
                "totalActiveMinutes": 42,
                "avgSpO2": null,
                "stressLevel": 2.7
            })
        );
    }

    #[test]
    fn test_sleep_ranges_are_validated() {
        let request: HealthAnalysisRequest = serde_json::from_value(json!({
            "userId": "u1",
            "date": "2024-05-01",
            "metrics": [],
            "sleepData": {
                "durationHours": 30.0,
                "qualityScore": 80,
                "deepSleepMinutes": 60,
                "remSleepMinutes": 90,
                "lightSleepMinutes": 200
            }
        }))
        .unwrap();

        assert!(request.validate().is_err());
    }
}
