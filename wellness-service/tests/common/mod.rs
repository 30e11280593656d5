use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use wellness_service::config::{ImageConfig, ModelConfig, OpenRouterConfig, WellnessConfig};
use wellness_service::startup::Application;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANALYSIS_MODEL: &str = "test/analysis-model";
pub const COACH_MODEL: &str = "test/coach-model";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    /// Stands in for the chat-completion API.
    pub model_server: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_key(Some("test-key")).await
    }

    pub async fn spawn_with_key(api_key: Option<&str>) -> Self {
        Self::spawn_with(api_key, 5).await
    }

    /// Spawn with a short model-call timeout, for exercising slow upstreams.
    pub async fn spawn_with_timeout(request_timeout_secs: u64) -> Self {
        Self::spawn_with(Some("test-key"), request_timeout_secs).await
    }

    async fn spawn_with(api_key: Option<&str>, request_timeout_secs: u64) -> Self {
        let model_server = MockServer::start().await;

        let config = WellnessConfig {
            common: CoreConfig { port: 0 }, // Random port for testing
            openrouter: OpenRouterConfig {
                api_key: api_key.map(|key| Secret::new(key.to_string())),
                base_url: model_server.uri(),
                request_timeout_secs,
            },
            models: ModelConfig {
                analysis_model: ANALYSIS_MODEL.to_string(),
                coach_model: COACH_MODEL.to_string(),
            },
            image: ImageConfig {
                max_side: 800,
                jpeg_quality: 75,
                max_pixels: 40_000_000,
            },
            otlp_endpoint: None,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            model_server,
        }
    }

    pub async fn post_json(&self, route: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, route))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Answer every single-shot completion with `content` as the assistant text.
    pub async fn mock_completion(&self, content: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .expect(expected_calls)
            .mount(&self.model_server)
            .await;
    }

    /// Answer streaming completions with the given deltas and a final `[DONE]`.
    pub async fn mock_stream(&self, deltas: &[&str]) {
        let body: String = deltas
            .iter()
            .map(|delta| {
                format!(
                    "data: {}\n\n",
                    json!({"choices": [{"delta": {"content": delta}}]})
                )
            })
            .chain(std::iter::once("data: [DONE]\n\n".to_string()))
            .collect();

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .expect(1)
            .mount(&self.model_server)
            .await;
    }
}

/// `data:` payloads of a server-sent event body, in order.
pub fn sse_payloads(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start().to_string())
        .collect()
}
