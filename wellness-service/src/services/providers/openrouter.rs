//! OpenRouter chat-completion client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` API in both single-shot
//! and streaming (`text/event-stream`) modes. No retries happen here: every
//! upstream failure is classified and handed back to the caller.

use super::sse::decode_chat_stream;
use super::{ChatProvider, ChatStream, CompletionOptions, ProviderError};
use crate::config::OpenRouterConfig;
use crate::models::ModelMessage;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use reqwest::{header::RETRY_AFTER, Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;

/// OpenRouter provider.
pub struct OpenRouterProvider {
    api_key: Option<Secret<String>>,
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl OpenRouterProvider {
    pub fn new(config: &OpenRouterConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            timeout: config.request_timeout(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request<'a>(
        &self,
        messages: &'a [ModelMessage],
        options: &'a CompletionOptions,
        stream: bool,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
            stream,
        }
    }

    /// Issue the request and turn any non-2xx status into a classified error.
    async fn send(&self, request: &ChatCompletionRequest<'_>) -> Result<Response, ProviderError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            tracing::error!("OPENROUTER_API_KEY is not set; refusing model call");
            ProviderError::NotConfigured("missing OpenRouter API key".to_string())
        })?;

        tracing::debug!(
            model = %request.model,
            message_count = request.messages.len(),
            stream = request.stream,
            "Sending request to OpenRouter"
        );

        let response = self
            .client
            .traced_post(&self.endpoint)
            .bearer_auth(api_key.expose_secret())
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "OpenRouter request failed before a response");
                ProviderError::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        tracing::error!(
            status = status.as_u16(),
            body = %body,
            model = %request.model,
            "OpenRouter returned an error status"
        );

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited { retry_after });
        }

        Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    async fn complete(
        &self,
        messages: &[ModelMessage],
        options: &CompletionOptions,
    ) -> Result<String, ProviderError> {
        let request = self.build_request(messages, options, false);
        let response = self.send(&request).await?;

        let payload: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to decode OpenRouter response");
            ProviderError::from(e)
        })?;

        if let Some(error) = &payload.error {
            tracing::warn!(error = %error, "OpenRouter response carried an error object");
        }

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                tracing::error!(model = %options.model, "OpenRouter response had no content");
                ProviderError::EmptyResponse
            })
    }

    async fn stream(&self, messages: &[ModelMessage], options: &CompletionOptions) -> ChatStream {
        let request = self.build_request(messages, options, true);

        match self.send(&request).await {
            Ok(response) => {
                let body = response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(ProviderError::from));
                decode_chat_stream(body)
            }
            Err(err) => Box::pin(stream::once(async move { Err(err) })),
        }
    }
}

// ============================================================================
// OpenAI-compatible Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ModelMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, api_key: Option<&str>) -> OpenRouterProvider {
        OpenRouterProvider::new(&OpenRouterConfig {
            api_key: api_key.map(|k| Secret::new(k.to_string())),
            base_url: server.uri(),
            request_timeout_secs: 5,
        })
        .unwrap()
    }

    fn options() -> CompletionOptions {
        CompletionOptions::new("test-model").temperature(0.1).json()
    }

    #[tokio::test]
    async fn test_complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"purpose\": \"focus\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let text = provider
            .complete(&[ModelMessage::user("hi")], &options())
            .await
            .unwrap();

        assert_eq!(text, "{\"purpose\": \"focus\"}");
    }

    #[tokio::test]
    async fn test_complete_classifies_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let err = provider
            .complete(&[ModelMessage::user("hi")], &options())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::RateLimited {
                retry_after: Some(12)
            }
        );
    }

    #[tokio::test]
    async fn test_complete_classifies_other_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let err = provider
            .complete(&[ModelMessage::user("hi")], &options())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ProviderError::Api {
                status: 503,
                body: "upstream down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"message": "No endpoints found"}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let err = provider
            .complete(&[ModelMessage::user("hi")], &options())
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        assert!(!provider.is_configured());

        let err = provider
            .complete(&[ModelMessage::user("hi")], &options())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::new(&OpenRouterConfig {
            api_key: Some(Secret::new("test-key".to_string())),
            base_url: server.uri(),
            request_timeout_secs: 1,
        })
        .unwrap();

        let err = provider
            .complete(&[ModelMessage::user("hi")], &options())
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Timeout);
    }

    #[tokio::test]
    async fn test_stream_relays_deltas_in_order() {
        let server = MockServer::start().await;
        let body: String = ["Eat", " slowly", "."]
            .iter()
            .map(|t| format!("data: {}\n\n", json!({"choices": [{"delta": {"content": t}}]})))
            .chain(std::iter::once("data: [DONE]\n\n".to_string()))
            .collect();
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let items: Vec<_> = provider
            .stream(&[ModelMessage::user("hi")], &CompletionOptions::new("coach"))
            .await
            .collect()
            .await;

        assert_eq!(
            items,
            vec![
                Ok("Eat".to_string()),
                Ok(" slowly".to_string()),
                Ok(".".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_error_status_becomes_single_error_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let items: Vec<_> = provider
            .stream(&[ModelMessage::user("hi")], &CompletionOptions::new("coach"))
            .await
            .collect()
            .await;

        assert_eq!(
            items,
            vec![Err(ProviderError::Api {
                status: 500,
                body: "boom".to_string()
            })]
        );
    }

    #[tokio::test]
    async fn test_slow_stream_ends_with_single_timeout_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: [DONE]\n\n", "text/event-stream")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let provider = OpenRouterProvider::new(&OpenRouterConfig {
            api_key: Some(Secret::new("test-key".to_string())),
            base_url: server.uri(),
            request_timeout_secs: 1,
        })
        .unwrap();

        let items: Vec<_> = provider
            .stream(&[ModelMessage::user("hi")], &CompletionOptions::new("coach"))
            .await
            .collect()
            .await;

        assert_eq!(items, vec![Err(ProviderError::Timeout)]);
    }
}
