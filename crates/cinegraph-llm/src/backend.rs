//! Core LLM backend trait.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// LLM-related errors.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Context too long: {0}")]
    ContextTooLong(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Timeout after {0} seconds")]
    Timeout(u32),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Configuration for LLM requests.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Model name/identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = most random).
    pub temperature: f32,
    /// Context window requested from backends that accept one.
    pub context_size: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            context_size: 4096,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Create config for OpenAI.
    pub fn openai() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
            ..Self::default()
        }
    }

    /// Create config for Ollama.
    pub fn ollama() -> Self {
        Self {
            model: "deepseek-r1:7b".to_string(),
            temperature: 0.3,
            timeout_secs: 120, // Local models can be slower
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature, clamped to `0.0..=1.0`.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn with_context_size(mut self, context_size: u32) -> Self {
        self.context_size = context_size;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Core trait for LLM backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Get the current configuration.
    fn config(&self) -> &LlmConfig;

    /// Generate text for a user prompt under an optional system instruction.
    async fn complete(&self, system: Option<&str>, prompt: &str) -> LlmResult<String>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> LlmResult<bool> {
        match self.complete(None, "ping").await {
            Ok(_) => Ok(true),
            Err(LlmError::ConnectionFailed(_)) | Err(LlmError::AuthenticationFailed) => Ok(false),
            Err(_) => Ok(true),
        }
    }
}

/// A scripted backend for tests and offline runs.
///
/// Replies with the first canned response whose pattern occurs in the prompt,
/// otherwise with a fixed default. Every call is counted.
pub struct MockBackend {
    config: LlmConfig,
    responses: Vec<(String, String)>,
    default_response: String,
    failing: bool,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<(Option<String>, String)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            config: LlmConfig::default().with_model("mock"),
            responses: Vec::new(),
            default_response: "Mock response".to_string(),
            failing: false,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Add a canned response for a prompt pattern.
    pub fn with_response(mut self, pattern: &str, response: &str) -> Self {
        self.responses.push((pattern.to_string(), response.to_string()));
        self
    }

    /// Reply used when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    /// Make every call fail as if the service were unreachable.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of `complete` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The `(system, prompt)` pair of the most recent call.
    pub fn last_prompt(&self) -> Option<(Option<String>, String)> {
        self.last_prompt.lock().ok().and_then(|guard| guard.clone())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn complete(&self, system: Option<&str>, prompt: &str) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_prompt.lock() {
            *guard = Some((system.map(str::to_string), prompt.to_string()));
        }

        if self.failing {
            return Err(LlmError::ConnectionFailed("mock backend is offline".to_string()));
        }

        for (pattern, response) in &self.responses {
            if prompt.contains(pattern.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(self.default_response.clone())
    }

    async fn health_check(&self) -> LlmResult<bool> {
        Ok(!self.failing)
    }
}
