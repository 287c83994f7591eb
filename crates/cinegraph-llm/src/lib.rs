//! # Cinegraph LLM
//!
//! Chat-style language-model calls: one system instruction, one user prompt,
//! generated text back.
//!
//! ## Features
//!
//! - `api`: OpenAI chat completions
//! - `local`: Ollama
//! - `full`: All backends
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cinegraph_llm::{LlmBackend, OllamaBackend};
//!
//! let backend = OllamaBackend::new("http://localhost:11434")?;
//! let text = backend.complete(Some("Be concise."), "Who directed Inception?").await?;
//! ```

mod backend;

pub use backend::{LlmBackend, LlmConfig, LlmError, LlmResult, MockBackend};

#[cfg(any(feature = "local", feature = "api"))]
mod http;

#[cfg(feature = "local")]
mod ollama;
#[cfg(feature = "local")]
pub use ollama::OllamaBackend;

#[cfg(feature = "api")]
mod openai;
#[cfg(feature = "api")]
pub use openai::OpenAiBackend;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{LlmBackend, LlmConfig, LlmError, LlmResult, MockBackend};

    #[cfg(feature = "local")]
    pub use crate::OllamaBackend;

    #[cfg(feature = "api")]
    pub use crate::OpenAiBackend;
}
