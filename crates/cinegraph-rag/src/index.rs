//! Index build and lazy rebuild.
//!
//! A build is a full batch job: scan the graph store, render every entity to
//! its descriptive text, embed, normalize for inner product, then persist the
//! index and its entry list together.

use crate::error::{RagError, RagResult};
use crate::graph::{GraphStore, DEFAULT_SCAN_LIMIT};
use cinegraph_embeddings::{normalize_l2, Embedder};
use cinegraph_vectors::{
    DistanceMetric, FlatIndex, IndexEntry, IndexPaths, PersistedIndex, VectorError,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Progress callback: `(embedded, total)`.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Builds the vector index from the graph store.
#[derive(Clone)]
pub struct IndexBuilder {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
    metric: DistanceMetric,
    limit: usize,
    batch_size: usize,
    progress: Option<ProgressFn>,
}

impl IndexBuilder {
    pub fn new(store: Arc<dyn GraphStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            metric: DistanceMetric::default(),
            limit: DEFAULT_SCAN_LIMIT,
            batch_size: 64,
            progress: None,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Maximum entities scanned from the store.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Build an index in memory.
    pub async fn build(&self) -> RagResult<PersistedIndex> {
        let movies = self.store.all_movies(self.limit).await?;
        if movies.is_empty() {
            return Err(RagError::NoEntities);
        }
        info!(
            movies = movies.len(),
            store = self.store.name(),
            model = self.embedder.model_name(),
            "Building vector index"
        );

        let texts: Vec<String> = movies.iter().map(|m| m.descriptive_text()).collect();
        let total = texts.len();
        let mut index = FlatIndex::new(self.embedder.dimension(), self.metric);

        for chunk in texts.chunks(self.batch_size) {
            let embedder = Arc::clone(&self.embedder);
            let batch = chunk.to_vec();
            let mut vectors = tokio::task::spawn_blocking(move || {
                let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
                embedder.embed_batch(&refs)
            })
            .await??;

            if self.metric.requires_normalization() {
                for vector in &mut vectors {
                    normalize_l2(vector);
                }
            }
            index.add(&vectors)?;

            if let Some(progress) = &self.progress {
                progress(index.len(), total);
            }
        }

        let entries = movies
            .iter()
            .map(|m| IndexEntry::new(m.id.clone()).with_attributes(m.index_attributes()))
            .collect();
        Ok(PersistedIndex::new(index, entries)?)
    }

    /// Build and write both files.
    pub async fn rebuild(&self, paths: &IndexPaths) -> RagResult<PersistedIndex> {
        let built = self.build().await?;
        let to_save = built.clone();
        let target = paths.clone();
        tokio::task::spawn_blocking(move || to_save.save(&target)).await??;
        info!(vectors = built.len(), "Vector index rebuilt");
        Ok(built)
    }

    /// Load the index, rebuilding it when it is missing, inconsistent, or
    /// built for a different embedder or metric.
    pub async fn ensure(&self, paths: &IndexPaths) -> RagResult<PersistedIndex> {
        let target = paths.clone();
        let loaded = tokio::task::spawn_blocking(move || PersistedIndex::load(&target)).await?;

        match loaded {
            Ok(index) if self.is_compatible(&index) => {
                info!(vectors = index.len(), "Loaded vector index");
                Ok(index)
            }
            Ok(index) => {
                warn!(
                    dimension = index.index().dimension(),
                    expected = self.embedder.dimension(),
                    metric = index.index().metric().as_str(),
                    "Index does not match the configured embedder; rebuilding"
                );
                self.rebuild(paths).await
            }
            Err(VectorError::NotFound(path)) => {
                info!(path = %path, "No vector index found; building");
                self.rebuild(paths).await
            }
            Err(VectorError::Corrupt(reason)) => {
                warn!(reason = %reason, "Vector index is inconsistent; rebuilding");
                self.rebuild(paths).await
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_compatible(&self, index: &PersistedIndex) -> bool {
        index.index().dimension() == self.embedder.dimension()
            && index.index().metric() == self.metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MemoryGraphStore, MovieSeed};
    use cinegraph_embeddings::HashEmbedder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn builder() -> IndexBuilder {
        let store = MemoryGraphStore::from_seeds([
            MovieSeed::new("1").with_title("Heat"),
            MovieSeed::new("2").with_title("Ronin"),
            MovieSeed::new("3").with_title("Thief"),
        ])
        .unwrap();
        IndexBuilder::new(Arc::new(store), Arc::new(HashEmbedder::new(32)))
    }

    #[tokio::test]
    async fn test_build_aligns_entries() {
        let index = builder().with_batch_size(2).build().await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.index().len(), index.entries().len());
        assert_eq!(index.entries()[1].id, "2");
        assert_eq!(index.entries()[1].attributes["title"], "Ronin");
    }

    #[tokio::test]
    async fn test_empty_store_is_an_error() {
        let builder = IndexBuilder::new(
            Arc::new(MemoryGraphStore::new()),
            Arc::new(HashEmbedder::new(8)),
        );
        assert!(matches!(builder.build().await, Err(RagError::NoEntities)));
    }

    #[tokio::test]
    async fn test_progress_reported() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        builder()
            .with_batch_size(1)
            .with_progress(Arc::new(move |done: usize, total: usize| {
                assert!(done <= total);
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_ensure_builds_then_loads() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "movie_index.bin", "movies_list.json");

        let built = builder().ensure(&paths).await.unwrap();
        assert!(paths.exists());

        let loaded = builder().ensure(&paths).await.unwrap();
        assert_eq!(loaded.entries(), built.entries());
    }

    #[tokio::test]
    async fn test_ensure_rebuilds_stale_entry_list() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "i.bin", "e.json");
        builder().rebuild(&paths).await.unwrap();

        std::fs::write(&paths.entries, r#"[{"id": "1"}]"#).unwrap();
        let repaired = builder().ensure(&paths).await.unwrap();
        assert_eq!(repaired.len(), 3);
        assert_eq!(PersistedIndex::load(&paths).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_ensure_rebuilds_on_dimension_change() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::in_dir(dir.path(), "i.bin", "e.json");
        builder().rebuild(&paths).await.unwrap();

        let store =
            MemoryGraphStore::from_seeds([MovieSeed::new("9").with_title("Collateral")]).unwrap();
        let wider = IndexBuilder::new(Arc::new(store), Arc::new(HashEmbedder::new(64)));
        let index = wider.ensure(&paths).await.unwrap();
        assert_eq!(index.index().dimension(), 64);
        assert_eq!(index.len(), 1);
    }
}
