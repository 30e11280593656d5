use crate::error::AnalysisError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[validate(length(min = 1, message = "Event title is required"))]
    pub event_title: String,
    /// ISO-8601 date-time, with or without offset.
    pub start_time: String,
    pub end_time: String,
}

/// Validated bounds of an event.
///
/// `start` and `end` are wall-clock readings as written by the caller; the
/// duration is measured on the instants when both bounds carry an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: i64,
}

impl EventRequest {
    /// Parse both bounds. The end may not precede the start.
    pub fn window(&self) -> Result<EventWindow, AnalysisError> {
        if self.event_title.trim().is_empty() {
            return Err(AnalysisError::Validation(
                "Event title is required".to_string(),
            ));
        }

        let start = parse_event_time(&self.start_time)?;
        let end = parse_event_time(&self.end_time)?;
        let duration = end.elapsed_since(&start);
        if duration < Duration::zero() {
            return Err(AnalysisError::Validation(
                "Event end time must not be before its start time".to_string(),
            ));
        }

        Ok(EventWindow {
            start: start.wall_clock(),
            end: end.wall_clock(),
            duration_minutes: duration.num_minutes(),
        })
    }
}

/// A parsed event bound, with or without a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventTime {
    Offset(DateTime<FixedOffset>),
    Local(NaiveDateTime),
}

impl EventTime {
    pub fn wall_clock(&self) -> NaiveDateTime {
        match self {
            EventTime::Offset(time) => time.naive_local(),
            EventTime::Local(time) => *time,
        }
    }

    /// `self - earlier`. Mixed bounds fall back to wall-clock readings.
    fn elapsed_since(&self, earlier: &EventTime) -> Duration {
        match (self, earlier) {
            (EventTime::Offset(end), EventTime::Offset(start)) => *end - *start,
            _ => self.wall_clock() - earlier.wall_clock(),
        }
    }
}

/// Parse an ISO-8601 date-time, keeping its offset when one is given.
pub fn parse_event_time(value: &str) -> Result<EventTime, AnalysisError> {
    let value = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(EventTime::Offset(with_offset));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(EventTime::Local)
        .ok_or_else(|| AnalysisError::Validation(format!("Invalid date-time: '{}'", value)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecommendationResponse {
    pub event_title: String,
    pub event_time: String,
    /// One line per practice, each prefixed with a check mark.
    pub practices: String,
    pub nutrition_suggestion: String,
    pub purpose: String,
}
