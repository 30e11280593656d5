use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// OpenRouter's OpenAI-compatible API root.
const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

const DEFAULT_ANALYSIS_MODEL: &str = "qwen/qwen2.5-vl-32b-instruct:free";
const DEFAULT_COACH_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_IMAGE_MAX_SIDE: u32 = 800;
const DEFAULT_IMAGE_QUALITY: u8 = 75;
const DEFAULT_IMAGE_MAX_PIXELS: u64 = 40_000_000;

#[derive(Debug, Clone, Deserialize)]
pub struct WellnessConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub openrouter: OpenRouterConfig,
    pub models: ModelConfig,
    pub image: ImageConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterConfig {
    /// Bearer credential. Optional so a missing key surfaces per call, not at startup.
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl OpenRouterConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model for event, meal (vision), daily and health analyses
    pub analysis_model: String,
    /// Model for the streaming coach conversation
    pub coach_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    pub max_side: u32,
    pub jpeg_quality: u8,
    /// Uploads declaring more pixels than this are rejected before decoding.
    pub max_pixels: u64,
}

impl WellnessConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        Ok(WellnessConfig {
            common: common_config,
            openrouter: OpenRouterConfig {
                api_key: env::var("OPENROUTER_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .map(Secret::new),
                base_url: get_env(
                    "OPENROUTER_BASE_URL",
                    Some(DEFAULT_OPENROUTER_BASE_URL),
                    is_prod,
                )?,
                request_timeout_secs: get_env_parsed(
                    "WELLNESS_REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                    is_prod,
                )?,
            },
            models: ModelConfig {
                analysis_model: get_env(
                    "WELLNESS_ANALYSIS_MODEL",
                    Some(DEFAULT_ANALYSIS_MODEL),
                    is_prod,
                )?,
                coach_model: get_env("WELLNESS_COACH_MODEL", Some(DEFAULT_COACH_MODEL), is_prod)?,
            },
            image: ImageConfig {
                max_side: get_env_parsed("WELLNESS_IMAGE_MAX_SIDE", DEFAULT_IMAGE_MAX_SIDE, is_prod)?,
                jpeg_quality: get_env_parsed(
                    "WELLNESS_IMAGE_QUALITY",
                    DEFAULT_IMAGE_QUALITY,
                    is_prod,
                )?,
                max_pixels: get_env_parsed(
                    "WELLNESS_IMAGE_MAX_PIXELS",
                    DEFAULT_IMAGE_MAX_PIXELS,
                    is_prod,
                )?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
        })
    }
}
