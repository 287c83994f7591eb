//! Graph context fetching.

use crate::error::GraphResult;
use crate::graph::{FetchOptions, GraphStore};
use crate::retriever::ScoredId;
use cinegraph_core::{ContextBundle, MovieId, MovieRecord};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Turns retrieved identifiers into a [`ContextBundle`].
#[derive(Clone)]
pub struct ContextFetcher {
    store: Arc<dyn GraphStore>,
    options: FetchOptions,
    sort_by_rating: bool,
}

impl ContextFetcher {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            options: FetchOptions::default(),
            sort_by_rating: true,
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_sort_by_rating(mut self, enabled: bool) -> Self {
        self.sort_by_rating = enabled;
        self
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch records for `hits`, keeping retrieval order unless sorting by
    /// rating. Identifiers the store does not know are dropped.
    pub async fn fetch(&self, query: &str, hits: &[ScoredId]) -> GraphResult<ContextBundle> {
        let mut seen = HashSet::new();
        let ids: Vec<MovieId> = hits
            .iter()
            .filter(|hit| seen.insert(hit.id.as_str()))
            .map(|hit| hit.id.clone())
            .collect();

        if ids.is_empty() {
            return Ok(ContextBundle::empty(query));
        }

        let records = self.store.fetch_movies(&ids, &self.options).await?;
        let mut by_id: HashMap<MovieId, MovieRecord> =
            records.into_iter().map(|r| (r.id.clone(), r)).collect();

        let movies: Vec<MovieRecord> = ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(|record| {
                let mut record = record.coalesce();
                if self.options.paths {
                    record.paths = record.derive_paths();
                }
                record
            })
            .collect();

        debug!(
            requested = ids.len(),
            found = movies.len(),
            store = self.store.name(),
            "Fetched graph context"
        );

        let mut bundle = ContextBundle::new(query, movies);
        if self.sort_by_rating {
            bundle.sort_by_rating();
        }
        Ok(bundle)
    }
}
