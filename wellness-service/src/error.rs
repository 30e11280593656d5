//! Failure taxonomy of the analysis pipeline and its HTTP mapping.

use crate::services::providers::ProviderError;
use service_core::error::AppError;
use thiserror::Error;

pub const RATE_LIMITED_MESSAGE: &str =
    "The analysis service is temporarily overloaded. Please try again in a minute.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "Empty response from the model. Please retry later.";
pub const MALFORMED_OUTPUT_MESSAGE: &str = "Model returned malformed output";

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed or empty input; raised before any model call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Model provider rate limited the request")]
    RateLimited { retry_after: Option<u64> },

    #[error("Upstream error: {0}")]
    Upstream(ProviderError),

    #[error("Model returned no usable content")]
    EmptyResponse,

    /// The model replied, but not with a JSON object. `raw` keeps the text for diagnostics.
    #[error("Malformed model output: {reason}")]
    MalformedModelOutput { raw: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProviderError> for AnalysisError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited { retry_after } => AnalysisError::RateLimited { retry_after },
            ProviderError::EmptyResponse => AnalysisError::EmptyResponse,
            other => AnalysisError::Upstream(other),
        }
    }
}

impl From<validator::ValidationErrors> for AnalysisError {
    fn from(err: validator::ValidationErrors) -> Self {
        AnalysisError::Validation(err.to_string())
    }
}

impl AnalysisError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Validation(_) => "validation",
            AnalysisError::RateLimited { .. } => "rate_limited",
            AnalysisError::Upstream(_) => "upstream",
            AnalysisError::EmptyResponse => "empty_response",
            AnalysisError::MalformedModelOutput { .. } => "malformed_output",
            AnalysisError::Internal(_) => "internal",
        }
    }

    /// Message safe to show to the caller, e.g. as a stream error event.
    pub fn public_message(&self) -> String {
        match self {
            AnalysisError::Validation(msg) => msg.clone(),
            AnalysisError::RateLimited { .. } => RATE_LIMITED_MESSAGE.to_string(),
            AnalysisError::Upstream(err) => upstream_message(err),
            AnalysisError::EmptyResponse => EMPTY_RESPONSE_MESSAGE.to_string(),
            AnalysisError::MalformedModelOutput { .. } => MALFORMED_OUTPUT_MESSAGE.to_string(),
            AnalysisError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

fn upstream_message(err: &ProviderError) -> String {
    match err {
        ProviderError::NotConfigured(_) => "model provider authentication failed".to_string(),
        ProviderError::Api { status, .. } if *status == 401 || *status == 403 => {
            "model provider authentication failed".to_string()
        }
        ProviderError::Api { status, .. } => format!("model provider error (HTTP {})", status),
        ProviderError::Timeout => "model provider timed out".to_string(),
        ProviderError::Stream(msg) => format!("model provider error: {}", msg),
        _ => "model provider unavailable".to_string(),
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Validation(msg) => AppError::ValidationError(msg),
            AnalysisError::RateLimited { retry_after } => {
                AppError::TooManyRequests(RATE_LIMITED_MESSAGE.to_string(), retry_after)
            }
            AnalysisError::Upstream(ref provider_err) => {
                AppError::BadGateway(upstream_message(provider_err))
            }
            AnalysisError::EmptyResponse => {
                AppError::ServiceUnavailable(EMPTY_RESPONSE_MESSAGE.to_string())
            }
            AnalysisError::MalformedModelOutput { .. } => {
                AppError::UpstreamOutput(MALFORMED_OUTPUT_MESSAGE.to_string())
            }
            AnalysisError::Internal(msg) => AppError::InternalError(anyhow::anyhow!(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_provider_errors_are_classified() {
        assert!(matches!(
            AnalysisError::from(ProviderError::RateLimited { retry_after: None }),
            AnalysisError::RateLimited { .. }
        ));
        assert!(matches!(
            AnalysisError::from(ProviderError::EmptyResponse),
            AnalysisError::EmptyResponse
        ));
        assert!(matches!(
            AnalysisError::from(ProviderError::Timeout),
            AnalysisError::Upstream(ProviderError::Timeout)
        ));
    }

    #[test]
    fn test_each_class_has_its_own_status() {
        let statuses: Vec<StatusCode> = vec![
            AnalysisError::Validation("no samples".into()),
            AnalysisError::RateLimited { retry_after: None },
            AnalysisError::Upstream(ProviderError::Timeout),
            AnalysisError::EmptyResponse,
            AnalysisError::MalformedModelOutput {
                raw: "{".into(),
                reason: "eof".into(),
            },
        ]
        .into_iter()
        .map(|e| AppError::from(e).status_code())
        .collect();

        assert_eq!(
            statuses,
            vec![
                StatusCode::UNPROCESSABLE_ENTITY,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::INTERNAL_SERVER_ERROR,
            ]
        );
    }
}
