//! HTTP handlers, one router per endpoint group.

pub mod coach;
pub mod daily;
pub mod event;
pub mod health;
pub mod health_analysis;
pub mod meal;

use crate::error::AnalysisError;
use service_core::error::AppError;

/// Log a failed analysis under its endpoint and map it to an HTTP error.
pub(crate) fn reject(endpoint: &'static str, err: AnalysisError) -> AppError {
    match &err {
        AnalysisError::Validation(details) => {
            tracing::warn!(endpoint, details = %details, "Rejected invalid request");
        }
        other => {
            tracing::error!(endpoint, kind = other.kind(), error = %other, "Analysis failed");
        }
    }
    AppError::from(err)
}
