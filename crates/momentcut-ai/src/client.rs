//! Gemini API client.
//!
//! Sends a single prompt to `models/{model}:generateContent` with JSON
//! response mode and returns the raw text of the first candidate.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AiConfig;
use crate::error::{AiError, AiResult};

/// A text generation service that can be asked for moments.
#[async_trait]
pub trait MomentModel: Send + Sync {
    /// Model identifiers to try, in order.
    fn models(&self) -> Vec<String>;

    /// Send `prompt` to `model` and return its raw text output.
    async fn generate(&self, model: &str, prompt: &str) -> AiResult<String>;
}

/// Gemini API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    temperature: f32,
    client: Client,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    temperature: f32,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Create a client from configuration. Fails without an API key.
    pub fn new(config: &AiConfig) -> AiResult<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
            temperature: config.temperature,
            client,
        })
    }
}

#[async_trait]
impl MomentModel for GeminiClient {
    fn models(&self) -> Vec<String> {
        self.models.clone()
    }

    async fn generate(&self, model: &str, prompt: &str) -> AiResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: self.temperature,
            },
        };

        debug!(model, prompt_chars = prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Http {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(format!("failed to decode Gemini response: {}", e.without_url())))?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AiError::invalid_response("no candidates in Gemini response"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::invalid_response(format!(
                "empty Gemini output (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> AiConfig {
        AiConfig {
            api_key: Some("test-key".to_string()),
            base_url: server.uri(),
            models: vec!["test-model".to_string()],
            ..AiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"moments\": "}, {"text": "[]}"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server)).unwrap();
        let text = client.generate("test-model", "find moments").await.unwrap();
        assert_eq!(text, "{\"moments\": []}");
    }

    #[tokio::test]
    async fn test_rate_limit_is_retryable_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server)).unwrap();
        let err = client.generate("test-model", "p").await.unwrap_err();
        assert!(matches!(err, AiError::Http { status: 429, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(&server)).unwrap();
        let err = client.generate("test-model", "p").await.unwrap_err();
        assert!(matches!(err, AiError::InvalidResponse(ref msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            GeminiClient::new(&AiConfig::default()),
            Err(AiError::Config(_))
        ));
    }
}
