//! Local health metrics: aggregate statistics and rule-based alerts.
//!
//! Everything here is pure and deterministic. Alerts come only from the
//! samples, never from the model.

use crate::error::AnalysisError;
use crate::models::{HealthSample, SleepRecord};

/// Relative HRV drop (first half vs second half) that raises an alert.
pub const HRV_DROP_THRESHOLD: f64 = 0.20;
pub const SHORT_SLEEP_HOURS: f64 = 6.0;
pub const LOW_SPO2_PERCENT: f64 = 94.0;
pub const SEDENTARY_ALERT_HOURS: f64 = 22.0;
pub const MAX_STRESS_LEVEL: f64 = 10.0;

const MINUTES_PER_DAY: f64 = 1440.0;

pub const HRV_DROP_ALERT: &str = "HRV dropped more than 20% - possible stress or overtraining";
pub const LOW_ACTIVITY_ALERT: &str =
    "Very low activity detected - try to move more throughout the day";

/// Aggregates over one day of samples. Values are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStats {
    pub median_hrv: f64,
    pub avg_resting_hr: f64,
    /// Mean over the samples that carry SpO2; `None` when none do.
    pub avg_spo2: Option<f64>,
    pub total_steps: u64,
    pub total_calories: f64,
    pub total_active_minutes: u64,
    pub stress_level: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub stats: HealthStats,
    pub alerts: Vec<String>,
}

/// Compute statistics and alerts for a chronologically ordered day of samples.
pub fn analyze(
    samples: &[HealthSample],
    sleep: Option<&SleepRecord>,
) -> Result<MetricsReport, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::Validation(
            "No health metrics provided".to_string(),
        ));
    }

    let hrv: Vec<f64> = samples.iter().map(|s| s.hrv).collect();
    let resting: Vec<f64> = samples.iter().map(|s| s.resting_heart_rate).collect();
    let spo2: Vec<f64> = samples.iter().filter_map(|s| s.spo2).collect();

    let median_hrv = upper_median(&hrv).ok_or_else(|| {
        AnalysisError::Validation("HRV values are required".to_string())
    })?;

    let stats = HealthStats {
        median_hrv,
        avg_resting_hr: mean(&resting).unwrap_or_default(),
        avg_spo2: mean(&spo2),
        total_steps: checked_total(samples.iter().map(|s| s.steps), "steps")?,
        total_calories: samples.iter().map(|s| s.calories).sum(),
        total_active_minutes: checked_total(
            samples.iter().map(|s| s.active_minutes),
            "activeMinutes",
        )?,
        stress_level: stress_score(&hrv, median_hrv),
    };

    let alerts = collect_alerts(&hrv, &stats, sleep);

    Ok(MetricsReport { stats, alerts })
}

fn collect_alerts(hrv: &[f64], stats: &HealthStats, sleep: Option<&SleepRecord>) -> Vec<String> {
    let mut alerts = Vec::new();

    if hrv_dropped(hrv) {
        alerts.push(HRV_DROP_ALERT.to_string());
    }

    if let Some(sleep) = sleep {
        if sleep.duration_hours < SHORT_SLEEP_HOURS {
            alerts.push(format!(
                "Sleep duration low: {:.1}h (recommended: 7-9h)",
                sleep.duration_hours
            ));
        }
    }

    if let Some(avg_spo2) = stats.avg_spo2 {
        if avg_spo2 < LOW_SPO2_PERCENT {
            alerts.push(format!("Low blood oxygen: {:.1}% (normal: >95%)", avg_spo2));
        }
    }

    if sedentary_hours(stats.total_active_minutes) > SEDENTARY_ALERT_HOURS {
        alerts.push(LOW_ACTIVITY_ALERT.to_string());
    }

    alerts
}

/// Sum of counter readings; overflow means the input is not a real day.
fn checked_total(
    mut values: impl Iterator<Item = u64>,
    field: &str,
) -> Result<u64, AnalysisError> {
    values
        .try_fold(0u64, |total, value| total.checked_add(value))
        .ok_or_else(|| AnalysisError::Validation(format!("Total {} is out of range", field)))
}

/// Middle element of the sorted values, `sorted[len / 2]`.
///
/// Even-length input yields an element of the input, never an average.
pub fn upper_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted[sorted.len() / 2])
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// `min(10, variance around the median / 10)`. A heuristic, not a clinical score.
pub fn stress_score(hrv: &[f64], median: f64) -> f64 {
    if hrv.is_empty() {
        return 0.0;
    }
    let variance = hrv.iter().map(|x| (x - median).powi(2)).sum::<f64>() / hrv.len() as f64;
    (variance / 10.0).min(MAX_STRESS_LEVEL)
}

/// Relative drop from the first half's mean to the second half's mean.
///
/// The first half gets `len / 2` samples, so odd lengths give it the smaller
/// share. `None` when there are fewer than two samples or the baseline is not
/// positive.
pub fn hrv_drop_ratio(hrv: &[f64]) -> Option<f64> {
    if hrv.len() < 2 {
        return None;
    }
    let (first, second) = hrv.split_at(hrv.len() / 2);
    let baseline = mean(first)?;
    let recent = mean(second)?;
    if baseline > 0.0 {
        Some((baseline - recent) / baseline)
    } else {
        None
    }
}

fn hrv_dropped(hrv: &[f64]) -> bool {
    hrv_drop_ratio(hrv).is_some_and(|ratio| ratio > HRV_DROP_THRESHOLD)
}

/// Hours of the day not spent in active minutes.
pub fn sedentary_hours(total_active_minutes: u64) -> f64 {
    (MINUTES_PER_DAY - total_active_minutes as f64) / 60.0
}
