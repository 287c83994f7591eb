//! Graph store collaborators.
//!
//! The store owns entities and relationships; this crate only reads them.
//! One fetch contract covers every query shape: callers switch relationship
//! kinds on and off through [`FetchOptions`].

mod memory;
pub use memory::{MemoryGraphStore, MovieSeed, RatingSeed};

#[cfg(feature = "neo4j")]
mod neo4j;
#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jGraphStore;

use crate::error::GraphResult;
use async_trait::async_trait;
use cinegraph_core::{MovieId, MovieRecord};
use serde::{Deserialize, Serialize};

/// Row limit for a full scan at index-build time.
pub const DEFAULT_SCAN_LIMIT: usize = 50_000;

/// Which parts of an entity a fetch should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub actors: bool,
    pub directors: bool,
    pub genres: bool,
    /// Languages and countries.
    pub locales: bool,
    pub plot: bool,
    pub ratings: bool,
    /// Individual raters. Off by default: popular movies have thousands.
    pub raters: bool,
    /// Render relationship paths into the record.
    pub paths: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            actors: true,
            directors: true,
            genres: true,
            locales: true,
            plot: true,
            ratings: true,
            raters: false,
            paths: true,
        }
    }
}

impl FetchOptions {
    /// Everything, raters included.
    pub fn all() -> Self {
        Self {
            raters: true,
            ..Self::default()
        }
    }

    /// The fields that feed an entity's descriptive text.
    pub fn for_indexing() -> Self {
        Self {
            locales: false,
            ratings: false,
            raters: false,
            paths: false,
            ..Self::default()
        }
    }
}

/// Read-only access to the movie graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch one record per known identifier. Unknown identifiers are skipped.
    async fn fetch_movies(&self, ids: &[MovieId], options: &FetchOptions)
        -> GraphResult<Vec<MovieRecord>>;

    /// Scan up to `limit` entities for an index rebuild.
    async fn all_movies(&self, limit: usize) -> GraphResult<Vec<MovieRecord>>;

    async fn health_check(&self) -> GraphResult<bool> {
        Ok(true)
    }
}
