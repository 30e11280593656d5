use serde::{Deserialize, Serialize};
use validator::Validate;

/// One time-stamped reading from a wearable. Samples arrive in capture order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSample {
    pub timestamp: String,
    pub heart_rate: f64,
    pub resting_heart_rate: f64,
    pub hrv: f64,
    pub steps: u64,
    pub calories: f64,
    pub active_minutes: u64,
    #[serde(default)]
    pub spo2: Option<f64>,
}

/// Last night's sleep summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    #[validate(range(min = 0.0, max = 24.0, message = "Sleep duration must be between 0 and 24 hours"))]
    pub duration_hours: f64,

    #[validate(range(min = 0.0, max = 100.0, message = "Sleep quality score must be between 0 and 100"))]
    pub quality_score: f64,

    pub deep_sleep_minutes: u32,
    pub rem_sleep_minutes: u32,
    pub light_sleep_minutes: u32,
}
