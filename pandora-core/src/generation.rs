//! Generation module for Pandora — story text via a chat-completions API
//!
//! Provides a `GenerationBackend` trait with an OpenAI-compatible
//! implementation. The client makes exactly one attempt per call: failures
//! surface directly to the caller, which reports them through the uniform
//! service-error response.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default chat-completions endpoint root
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// GenerationBackend trait
// ============================================================================

/// Abstraction over text-generation providers.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text for the given prompt. The returned string is never empty.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

/// Generation errors
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Completion contained no text")]
    EmptyCompletion,
}

// ============================================================================
// Config types
// ============================================================================

/// Generation client configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationConfig {
    /// An absent key is tolerated here: the first call will fail with the
    /// provider's auth error instead of a startup rejection.
    pub fn new(api_key: Option<String>, model: String) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_settings(settings: &crate::config::GenerationSettings) -> Self {
        let mut config = Self::new(None, settings.model.clone());
        config.temperature = settings.temperature;
        config.max_tokens = settings.max_tokens;
        config
    }
}

/// Create the generation backend from configuration.
pub fn create_backend(
    config: GenerationConfig,
) -> Result<Box<dyn GenerationBackend>, GenerationError> {
    Ok(Box::new(OpenAiGenerationClient::new(config)?))
}

// ============================================================================
// Chat-completions API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// OpenAiGenerationClient
// ============================================================================

/// Chat-completions client — calls an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAiGenerationClient {
    client: Client,
    config: GenerationConfig,
    base_url: String,
}

impl OpenAiGenerationClient {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: GenerationConfig,
        base_url: String,
    ) -> Result<Self, GenerationError> {
        if config.api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set — generation will fail on first use");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Send one chat-completion request and return the generated text.
    pub async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "generation API error");

            return Err(GenerationError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }

        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for OpenAiGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.complete(prompt).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_key: &str) -> GenerationConfig {
        GenerationConfig {
            api_key: api_key.to_string(),
            model: "gpt-4".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    fn mock_completion_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": text } }
            ]
        })
    }

    #[tokio::test]
    async fn test_complete_calls_api_and_returns_text() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client = OpenAiGenerationClient::with_base_url(config, mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4",
                "messages": [{ "role": "user", "content": "tell me a story" }]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(mock_completion_response("Once upon a time...")),
            )
            .mount(&mock_server)
            .await;

        let result = client.complete("tell me a story").await;

        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
        assert_eq!(result.unwrap(), "Once upon a time...");
    }

    #[tokio::test]
    async fn test_complete_makes_exactly_one_attempt_on_500() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client = OpenAiGenerationClient::with_base_url(config, mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "message": "Internal server error", "type": "server_error" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client.complete("tell me a story").await;

        assert!(result.is_err(), "Expected error on 500 response");
        match result {
            Err(GenerationError::Api { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "Internal server error");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_surfaces_auth_error_on_first_use() {
        let mock_server = MockServer::start().await;
        // Empty key is accepted at construction; the API rejects the call.
        let config = test_config("");
        let client = OpenAiGenerationClient::with_base_url(config, mock_server.uri())
            .expect("Client must construct without an API key");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .mount(&mock_server)
            .await;

        let result = client.complete("tell me a story").await;

        match result {
            Err(GenerationError::Api { code, message }) => {
                assert_eq!(code, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_completion() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client = OpenAiGenerationClient::with_base_url(config, mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("")),
            )
            .mount(&mock_server)
            .await;

        let result = client.complete("tell me a story").await;

        assert!(result.is_err(), "Empty completion must be an error");
        assert!(matches!(result, Err(GenerationError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn test_complete_handles_unparseable_error_body() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let client = OpenAiGenerationClient::with_base_url(config, mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&mock_server)
            .await;

        let result = client.complete("tell me a story").await;

        match result {
            Err(GenerationError::Api { code, message }) => {
                assert_eq!(code, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_trait_dispatch() {
        let mock_server = MockServer::start().await;
        let config = test_config("test-api-key");
        let backend: Box<dyn GenerationBackend> = Box::new(
            OpenAiGenerationClient::with_base_url(config, mock_server.uri()).unwrap(),
        );

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("A story.")),
            )
            .mount(&mock_server)
            .await;

        let result = backend.generate("hello").await.unwrap();
        assert_eq!(result, "A story.");
        assert_eq!(backend.name(), "openai");
    }

    #[tokio::test]
    async fn test_request_carries_sampling_settings_when_set() {
        let mock_server = MockServer::start().await;
        // 0.5 is exactly representable in f32, so the serialized body matches.
        let mut config = test_config("test-api-key");
        config.temperature = Some(0.5);
        config.max_tokens = Some(1024);
        let client = OpenAiGenerationClient::with_base_url(config, mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4",
                "messages": [{ "role": "user", "content": "hi" }],
                "temperature": 0.5,
                "max_tokens": 1024
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(mock_completion_response("ok")),
            )
            .mount(&mock_server)
            .await;

        let result = client.complete("hi").await;
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result.err());
    }
}
