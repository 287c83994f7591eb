//! Ollama backend for local LLM inference.
//!
//! Requires the `local` feature and a running Ollama instance.

use crate::backend::{LlmBackend, LlmConfig, LlmError, LlmResult};
use crate::http::{build_client, map_send_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ollama API request.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
}

/// Ollama API response.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: Option<String>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama backend for local LLM inference.
///
/// # Example
///
/// ```rust,ignore
/// use cinegraph_llm::{OllamaBackend, LlmBackend};
///
/// let backend = OllamaBackend::localhost()?;
/// let answer = backend.complete(None, "Name a heist movie").await?;
/// ```
pub struct OllamaBackend {
    endpoint: String,
    config: LlmConfig,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(endpoint: &str) -> LlmResult<Self> {
        Self::with_config(endpoint, LlmConfig::ollama())
    }

    /// Create with custom config.
    pub fn with_config(endpoint: &str, config: LlmConfig) -> LlmResult<Self> {
        let client = build_client(&config)?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            config,
            client,
        })
    }

    /// Create with default localhost endpoint.
    pub fn localhost() -> LlmResult<Self> {
        Self::new("http://localhost:11434")
    }

    /// Set the model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, system: Option<&str>, prompt: &str) -> OllamaRequest {
        OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            system: system.map(|s| s.to_string()),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
                num_ctx: self.config.context_size,
            },
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn complete(&self, system: Option<&str>, prompt: &str) -> LlmResult<String> {
        let request = self.build_request(system, prompt);
        let url = format!("{}/api/generate", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                map_send_error(e, &format!("Ollama at {}. Is Ollama running?", self.endpoint), &self.config)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 {
                return Err(LlmError::ModelNotFound(format!(
                    "Model '{}' not found. Run: ollama pull {}",
                    self.config.model, self.config.model
                )));
            }

            return Err(LlmError::ApiError(format!("Ollama error {}: {}", status, body)));
        }

        let resp: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        debug!(model = %self.config.model, tokens = ?resp.eval_count, "Ollama completion");

        resp.response
            .ok_or_else(|| LlmError::InvalidResponse("missing 'response' field".to_string()))
    }

    async fn health_check(&self) -> LlmResult<bool> {
        let url = format!("{}/api/tags", self.endpoint);

        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_creation() {
        let backend = OllamaBackend::localhost().unwrap();
        assert_eq!(backend.name(), "ollama");
        assert_eq!(backend.config().model, "deepseek-r1:7b");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = OllamaBackend::new("http://gpu-box:11434/").unwrap();
        assert_eq!(backend.endpoint(), "http://gpu-box:11434");
    }

    #[test]
    fn test_request_shape() {
        let backend = OllamaBackend::localhost().unwrap().with_model("llama3");
        let request = backend.build_request(Some("sys"), "hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3");
        assert_eq!(json["stream"], false);
        assert_eq!(json["system"], "sys");
        assert_eq!(json["options"]["num_ctx"], 4096);
    }

    #[test]
    fn test_response_without_text_field() {
        let resp: OllamaResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(resp.response.is_none());
    }
}
