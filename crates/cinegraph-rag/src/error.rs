//! Error types for graph access and the retrieval pipeline.

use cinegraph_embeddings::EmbeddingError;
use cinegraph_llm::LlmError;
use cinegraph_vectors::VectorError;
use thiserror::Error;

/// Errors raised by graph store collaborators.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph store unreachable: {0}")]
    Connection(String),

    #[error("Graph query failed: {0}")]
    Query(String),

    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Pipeline-level errors.
#[derive(Debug, Error)]
pub enum RagError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("No entities found in the graph store")]
    NoEntities,

    #[error("Invalid pipeline configuration: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type RagResult<T> = Result<T, RagError>;

impl From<tokio::task::JoinError> for RagError {
    fn from(err: tokio::task::JoinError) -> Self {
        RagError::Task(err.to_string())
    }
}
