//! # Cinegraph RAG
//!
//! Graph-augmented retrieval over a movie knowledge graph.
//!
//! A question is embedded, matched against a precomputed vector index, the
//! nearest entities are looked up in the graph store, and the resulting
//! context is rendered into a prompt for a language model.
//!
//! ## Stages
//!
//! | Stage | Type |
//! |-------|------|
//! | Similarity retrieval | [`Retriever`] |
//! | Graph context | [`ContextFetcher`] over a [`GraphStore`] |
//! | Prompt and answer | [`PromptComposer`], [`GraphRag`] |
//! | Index build | [`IndexBuilder`] |
//!
//! ## Features
//!
//! - `neo4j`: [`Neo4jGraphStore`](graph::Neo4jGraphStore) via `neo4rs`

pub mod context;
pub mod directive;
pub mod error;
pub mod graph;
pub mod index;
pub mod pipeline;
pub mod prelude;
pub mod prompt;
pub mod retriever;

pub use context::ContextFetcher;
pub use directive::{strip_directives, Directive, DirectiveRule, DirectiveRules};
pub use error::{GraphError, GraphResult, RagError, RagResult};
pub use graph::{FetchOptions, GraphStore, MemoryGraphStore, MovieSeed};
pub use index::IndexBuilder;
pub use pipeline::{Answer, AnswerOutcome, GraphRag, GraphRagBuilder};
pub use prompt::{ListLimits, Persona, PromptComposer, PromptPolicy};
pub use retriever::{RetrievalConfig, Retriever, ScoredId};
