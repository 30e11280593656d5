//! Chat-completion provider abstraction.
//!
//! The analysis pipeline talks to the model through [`ChatProvider`], so the
//! OpenRouter client can be swapped for the scripted mock in tests.

pub mod mock;
pub mod openrouter;
pub mod sse;

use crate::models::ModelMessage;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limited by provider")]
    RateLimited { retry_after: Option<u64> },

    #[error("Provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Provider request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider reported a stream error: {0}")]
    Stream(String),

    #[error("Invalid provider payload: {0}")]
    InvalidPayload(String),

    #[error("Provider returned no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::InvalidPayload(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Lazy, finite sequence of text deltas.
///
/// An `Err` item is always the last one. Dropping the stream stops pulling
/// from the provider and releases the connection.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Per-call generation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider for a single JSON object reply.
    pub json_response: bool,
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            json_response: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Single-shot completion returning the assistant's raw text.
    async fn complete(
        &self,
        messages: &[ModelMessage],
        options: &CompletionOptions,
    ) -> Result<String, ProviderError>;

    /// Streaming completion.
    ///
    /// Never fails up front: connection and status errors are delivered as the
    /// final stream item so callers can close their own stream cleanly.
    async fn stream(&self, messages: &[ModelMessage], options: &CompletionOptions) -> ChatStream;
}
