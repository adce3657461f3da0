//! Text-generation proxy.
//!
//! A thin client for an OpenAI-compatible chat-completions API. Provider
//! failures are typed: a caller can always distinguish generated content
//! from an unavailable provider or a failed upstream request, and no error
//! is ever returned as plain text in the success payload.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default upstream model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Typed failure of the text-generation path.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// No API key configured, or the provider could not be reached at all.
    #[error("text-generation provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with a non-success status.
    #[error("provider request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Client for the text-generation provider.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl LlmClient {
    /// Create a client with an explicit base URL and key.
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Create a client from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var("OPENAI_API_KEY").ok();
        Self::new(&base_url, api_key)
    }

    /// Whether a key is configured; reported by the health endpoint.
    pub fn available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a completion for the prompt.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::Unavailable("no API key configured".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Proxying generation request to {} (model {})", url, model);

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ProviderError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::RequestFailed {
                status: status.as_u16(),
                message: format!("invalid response body: {}", e),
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::RequestFailed {
                status: status.as_u16(),
                message: "response contained no choices".to_string(),
            })
    }

    /// Summarize a text via the provider.
    pub async fn summarize(&self, text: &str, model: &str) -> Result<String, ProviderError> {
        let prompt = format!("Summarize the following text concisely:\n\n{}", text);
        self.generate(&prompt, model).await
    }

    /// Complete a code fragment via the provider.
    pub async fn code_complete(&self, code: &str, model: &str) -> Result<String, ProviderError> {
        let prompt = format!(
            "Complete the following code. Reply with code only, no commentary:\n\n{}",
            code
        );
        self.generate(&prompt, model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_reflects_key_presence() {
        let without = LlmClient::new(DEFAULT_BASE_URL, None);
        assert!(!without.available());

        let with = LlmClient::new(DEFAULT_BASE_URL, Some("sk-test".to_string()));
        assert!(with.available());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = LlmClient::new("https://example.test/v1/", None);
        assert_eq!(client.base_url, "https://example.test/v1");
    }

    #[tokio::test]
    async fn test_generate_without_key_is_unavailable() {
        let client = LlmClient::new(DEFAULT_BASE_URL, None);
        let err = client.generate("hello", DEFAULT_MODEL).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::RequestFailed {
            status: 500,
            message: "upstream exploded".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("upstream exploded"));
    }
}
