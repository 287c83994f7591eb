//! OpenAI chat-completions backend.
//!
//! Requires the `api` feature and an OpenAI API key.

use crate::backend::{LlmBackend, LlmConfig, LlmError, LlmResult};
use crate::http::{build_client, map_send_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// OpenAI backend for GPT models.
///
/// # Example
///
/// ```rust,ignore
/// use cinegraph_llm::{OpenAiBackend, LlmBackend};
///
/// let backend = OpenAiBackend::from_env()?;
/// let answer = backend.complete(Some("You are a film buff."), "Best heist movie?").await?;
/// ```
pub struct OpenAiBackend {
    api_key: String,
    config: LlmConfig,
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiBackend {
    pub fn new(api_key: &str) -> LlmResult<Self> {
        Self::with_config(api_key, LlmConfig::openai())
    }

    /// Create with custom config.
    pub fn with_config(api_key: &str, config: LlmConfig) -> LlmResult<Self> {
        let client = build_client(&config)?;
        Ok(Self {
            api_key: api_key.to_string(),
            config,
            client,
            endpoint: OPENAI_API_URL.to_string(),
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> LlmResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| LlmError::AuthenticationFailed)?;
        Self::new(&api_key)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    /// Use a custom endpoint (for Azure OpenAI or compatible APIs).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Model listing next to the chat endpoint; used as a free reachability check.
    fn models_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let base = base.strip_suffix("/chat/completions").unwrap_or(base);
        format!("{}/models", base)
    }

    fn build_request(&self, system: Option<&str>, prompt: &str) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(OpenAiMessage {
                role: "system",
                content: sys.to_string(),
            });
        }
        messages.push(OpenAiMessage {
            role: "user",
            content: prompt.to_string(),
        });

        OpenAiRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

fn first_content(resp: OpenAiResponse) -> LlmResult<String> {
    resp.choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?
        .message
        .content
        .ok_or_else(|| LlmError::InvalidResponse("Choice has no message content".to_string()))
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn complete(&self, system: Option<&str>, prompt: &str) -> LlmResult<String> {
        let request = self.build_request(system, prompt);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error(e, "OpenAI API", &self.config))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            match status.as_u16() {
                401 => return Err(LlmError::AuthenticationFailed),
                429 => return Err(LlmError::RateLimited(60)),
                404 => return Err(LlmError::ModelNotFound(self.config.model.clone())),
                400 => {
                    if let Ok(error) = serde_json::from_str::<OpenAiError>(&body) {
                        if error.error.message.contains("maximum context length") {
                            return Err(LlmError::ContextTooLong(error.error.message));
                        }
                    }
                }
                _ => {}
            }

            return Err(LlmError::ApiError(format!("OpenAI API error {}: {}", status, body)));
        }

        let resp: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &resp.usage {
            debug!(model = %self.config.model, tokens = usage.total_tokens, "OpenAI completion");
        }

        first_content(resp)
    }

    async fn health_check(&self) -> LlmResult<bool> {
        let response = self
            .client
            .get(self.models_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_config() {
        let backend = OpenAiBackend::new("test-key").unwrap().with_model("gpt-4o");
        assert_eq!(backend.config.model, "gpt-4o");
        assert_eq!(backend.name(), "openai");
    }

    #[test]
    fn test_custom_endpoint() {
        let backend = OpenAiBackend::new("key")
            .unwrap()
            .with_endpoint("http://localhost:8080/v1/chat/completions");
        assert!(backend.endpoint.contains("localhost"));
    }

    #[test]
    fn test_models_url_sits_next_to_chat_endpoint() {
        let backend = OpenAiBackend::new("key").unwrap();
        assert_eq!(backend.models_url(), "https://api.openai.com/v1/models");

        let local = OpenAiBackend::new("key")
            .unwrap()
            .with_endpoint("http://localhost:8080/v1/chat/completions/");
        assert_eq!(local.models_url(), "http://localhost:8080/v1/models");

        let proxy = OpenAiBackend::new("key")
            .unwrap()
            .with_endpoint("http://proxy:9000/openai");
        assert_eq!(proxy.models_url(), "http://proxy:9000/openai/models");
    }

    #[tokio::test]
    async fn test_health_check_without_server_is_false() {
        let backend = OpenAiBackend::new("key")
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/v1/chat/completions");
        assert!(!backend.health_check().await.unwrap());
    }

    #[test]
    fn test_system_message_first() {
        let backend = OpenAiBackend::new("key").unwrap();
        let request = backend.build_request(Some("be brief"), "hi");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "hi");

        let request = backend.build_request(None, "hi");
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_malformed_bodies_are_invalid_responses() {
        let empty: OpenAiResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_content(empty), Err(LlmError::InvalidResponse(_))));

        let null_content: OpenAiResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(
            first_content(null_content),
            Err(LlmError::InvalidResponse(_))
        ));

        let ok: OpenAiResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "Hi"}}]}"#).unwrap();
        assert_eq!(first_content(ok).unwrap(), "Hi");
    }
}
