//! # Cinegraph
//!
//! Graph-augmented question answering over a movie knowledge graph.
//!
//! A question is embedded, matched against a precomputed vector index of
//! movies, the matches are expanded through the graph (directors, actors,
//! genres, ratings), and the rendered context is handed to a language model.
//! Answers that call for a visualization carry `<SHOW_GRAPH>` or
//! `<SHOW_BAR_CHART>` in front of the text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cinegraph::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let ctx = AppContext::open(config).await?;
//!
//! let answer = ctx.rag().answer("Who directed Inception?").await;
//! println!("{}", answer.text);
//!
//! ctx.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`cinegraph_core`] - Movie records, relationship paths, context bundles
//! - [`cinegraph_embeddings`] - Text embedders
//! - [`cinegraph_vectors`] - Flat vector index and its files
//! - [`cinegraph_llm`] - LLM backends
//! - [`cinegraph_rag`] - Graph stores, retrieval, prompts, the pipeline
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `neo4j` | Neo4j graph store |
//! | `api` | OpenAI embeddings and chat |
//! | `local` | Ollama embeddings and generate |
//! | `full` | All of the above |

pub mod config;
pub mod context;

// Re-export all subcrates
pub use cinegraph_core as core;
pub use cinegraph_embeddings as embeddings;
pub use cinegraph_llm as llm;
pub use cinegraph_rag as rag;
pub use cinegraph_vectors as vectors;

pub use config::Config;
pub use context::{build_index, AppContext, HealthReport};

/// Prelude module for convenient imports.
///
/// ```rust
/// use cinegraph::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        Config, EmbeddingProvider, GraphBackend, LlmProvider, CONFIG_FILE,
    };
    pub use crate::context::{build_index, AppContext, HealthReport};

    pub use cinegraph_rag::prelude::*;

    pub use cinegraph_embeddings::{Embedder, HashEmbedder};
    pub use cinegraph_llm::{LlmBackend, LlmConfig, MockBackend};
    pub use cinegraph_vectors::{DistanceMetric, IndexPaths, PersistedIndex};
}
