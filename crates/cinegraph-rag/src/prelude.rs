//! Cinegraph RAG prelude.
//!
//! ```rust
//! use cinegraph_rag::prelude::*;
//! ```

pub use crate::context::ContextFetcher;
pub use crate::directive::{
    prepend_directives, strip_directives, Directive, DirectiveRule, DirectiveRules,
};
pub use crate::error::{GraphError, GraphResult, RagError, RagResult};
pub use crate::graph::{FetchOptions, GraphStore, MemoryGraphStore, MovieSeed, RatingSeed};
pub use crate::index::IndexBuilder;
pub use crate::pipeline::{Answer, AnswerOutcome, GraphRag, GraphRagBuilder};
pub use crate::prompt::{ListLimits, Persona, PromptComposer, PromptPolicy};
pub use crate::retriever::{RetrievalConfig, Retriever, ScoredId};

#[cfg(feature = "neo4j")]
pub use crate::graph::Neo4jGraphStore;

pub use cinegraph_core::prelude::*;
