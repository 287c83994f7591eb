//! HTTP embedding backends (OpenAI-compatible, Ollama).
//!
//! Requires the `api` feature.

use crate::{Embedder, EmbeddingError, EmbeddingResult};
use serde::{Deserialize, Serialize};

/// API provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProvider {
    /// OpenAI embeddings (text-embedding-3-small, text-embedding-3-large).
    OpenAI,
    /// Local Ollama server (`/api/embed`).
    Ollama,
}

/// Configuration for API-based embeddings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub provider: ApiProvider,
    /// API key (ignored by Ollama).
    pub api_key: String,
    pub model: String,
    /// Full embeddings URL for OpenAI, server base URL for Ollama.
    pub endpoint: Option<String>,
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Create config for OpenAI embeddings.
    pub fn openai(api_key: &str) -> Self {
        Self {
            provider: ApiProvider::OpenAI,
            api_key: api_key.to_string(),
            model: "text-embedding-3-small".to_string(),
            endpoint: None,
            dimension: 1536,
            timeout_secs: 30,
        }
    }

    /// Create config for a local Ollama server.
    pub fn ollama(base_url: &str) -> Self {
        Self {
            provider: ApiProvider::Ollama,
            api_key: String::new(),
            model: "nomic-embed-text:latest".to_string(),
            endpoint: Some(base_url.trim_end_matches('/').to_string()),
            dimension: 768,
            timeout_secs: 60,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by a remote embedding service.
///
/// # Example
///
/// ```rust,ignore
/// use cinegraph_embeddings::{ApiConfig, ApiEmbedder, Embedder};
///
/// let embedder = ApiEmbedder::new(ApiConfig::ollama("http://localhost:11434"))?;
/// let vec = embedder.embed("who directed inception")?;
/// ```
pub struct ApiEmbedder {
    config: ApiConfig,
    client: reqwest::blocking::Client,
}

impl ApiEmbedder {
    pub fn new(config: ApiConfig) -> EmbeddingResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ApiError(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        match self.config.provider {
            ApiProvider::OpenAI => self
                .config
                .endpoint
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1/embeddings".to_string()),
            ApiProvider::Ollama => format!(
                "{}/api/embed",
                self.config
                    .endpoint
                    .as_deref()
                    .unwrap_or("http://localhost:11434")
            ),
        }
    }

    fn send<T: Serialize>(&self, body: &T) -> EmbeddingResult<reqwest::blocking::Response> {
        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(body);

        if self.config.provider == ApiProvider::OpenAI {
            request = request.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let response = request
            .send()
            .map_err(|e| EmbeddingError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            if status.as_u16() == 404 {
                return Err(EmbeddingError::ModelNotAvailable(format!(
                    "{} ({})",
                    self.config.model, body
                )));
            }
            return Err(EmbeddingError::ApiError(format!(
                "embedding API error {}: {}",
                status, body
            )));
        }

        Ok(response)
    }

    fn embed_openai(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let request = OpenAIRequest {
            model: &self.config.model,
            input: texts,
            dimensions: Some(self.config.dimension),
        };

        let resp: OpenAIResponse = self
            .send(&request)?
            .json()
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(resp.data.into_iter().map(|e| e.embedding).collect())
    }

    fn embed_ollama(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let request = OllamaRequest {
            model: &self.config.model,
            input: texts,
        };

        let resp: OllamaResponse = self
            .send(&request)?
            .json()
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(resp.embeddings)
    }
}

impl Embedder for ApiEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let vectors = match self.config.provider {
            ApiProvider::OpenAI => self.embed_openai(texts)?,
            ApiProvider::Ollama => self.embed_ollama(texts)?,
        };

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        for vector in &vectors {
            self.check_dimension(vector)?;
        }

        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let openai = ApiConfig::openai("test-key");
        assert_eq!(openai.provider, ApiProvider::OpenAI);
        assert_eq!(openai.model, "text-embedding-3-small");
        assert_eq!(openai.dimension, 1536);

        let ollama = ApiConfig::ollama("http://localhost:11434/");
        assert_eq!(ollama.provider, ApiProvider::Ollama);
        assert_eq!(ollama.endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(ollama.dimension, 768);
    }

    #[test]
    fn test_endpoints() {
        let embedder = ApiEmbedder::new(ApiConfig::ollama("http://gpu-box:11434")).unwrap();
        assert_eq!(embedder.endpoint(), "http://gpu-box:11434/api/embed");

        let embedder = ApiEmbedder::new(ApiConfig::openai("key")).unwrap();
        assert_eq!(embedder.endpoint(), "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn test_empty_batch_skips_request() {
        let embedder = ApiEmbedder::new(ApiConfig::openai("key")).unwrap();
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }
}
