//! # Cinegraph Embeddings
//!
//! Turns free text into fixed-length vectors.
//!
//! The embedding model is an external collaborator; this crate only wraps it
//! behind the [`Embedder`] trait:
//! - [`HashEmbedder`] - deterministic feature hashing, no model needed
//! - `ApiEmbedder` - OpenAI-compatible and Ollama embedding endpoints
//!
//! ## Features
//!
//! - `api`: HTTP embedders (OpenAI, Ollama)
//! - `full`: All backends
//!
//! ## Usage
//!
//! ```rust
//! use cinegraph_embeddings::{Embedder, HashEmbedder};
//!
//! let embedder = HashEmbedder::new(64);
//! let vector = embedder.embed("space heist thriller").unwrap();
//! assert_eq!(vector.len(), 64);
//! ```

mod embedder;
mod normalize;
mod simple;

pub use embedder::{Embedder, EmbeddingError, EmbeddingResult};
pub use normalize::{cosine_similarity, dot_product, l2_norm, normalize_l2, squared_l2_distance};
pub use simple::HashEmbedder;

#[cfg(feature = "api")]
mod api;
#[cfg(feature = "api")]
pub use api::{ApiConfig, ApiEmbedder, ApiProvider};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cosine_similarity, normalize_l2};
    pub use crate::{Embedder, EmbeddingError, EmbeddingResult, HashEmbedder};

    #[cfg(feature = "api")]
    pub use crate::{ApiConfig, ApiEmbedder, ApiProvider};
}
