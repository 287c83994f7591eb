//! Similarity retrieval over the persisted index.

use crate::error::RagResult;
use cinegraph_core::MovieId;
use cinegraph_vectors::{DistanceMetric, PersistedIndex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Retrieval knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Neighbours requested from the index.
    pub k: usize,
    /// Similarity floor (inner product) or distance ceiling (L2).
    pub min_similarity: Option<f32>,
    /// Order the context bundle by descending average rating.
    pub sort_by_rating: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 10,
            min_similarity: Some(0.3),
            sort_by_rating: true,
        }
    }
}

impl RetrievalConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_min_similarity(mut self, cutoff: Option<f32>) -> Self {
        self.min_similarity = cutoff;
        self
    }

    pub fn with_sort_by_rating(mut self, enabled: bool) -> Self {
        self.sort_by_rating = enabled;
        self
    }
}

/// A candidate identifier with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredId {
    pub id: MovieId,
    pub score: f32,
    /// Title kept in the entry list, when present.
    pub title: Option<String>,
}

/// Read-only nearest-neighbour lookup.
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Arc<PersistedIndex>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(index: Arc<PersistedIndex>, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn index(&self) -> &PersistedIndex {
        &self.index
    }

    pub fn metric(&self) -> DistanceMetric {
        self.index.index().metric()
    }

    pub fn search(&self, query_vector: &[f32]) -> RagResult<Vec<ScoredId>> {
        self.search_k(query_vector, self.config.k)
    }

    /// At most `k` identifiers, nearest first. Sentinel slots and hits that
    /// fail the cutoff are dropped.
    pub fn search_k(&self, query_vector: &[f32], k: usize) -> RagResult<Vec<ScoredId>> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        let k = k.min(self.index.len());

        let metric = self.metric();
        let hits = self.index.search(query_vector, k)?;

        let results: Vec<ScoredId> = hits
            .matches()
            .filter(|(_, score)| match self.config.min_similarity {
                Some(cutoff) => metric.passes(*score, cutoff),
                None => true,
            })
            .filter_map(|(row, score)| {
                self.index.entry(row as i64).map(|entry| ScoredId {
                    id: entry.id.clone(),
                    score,
                    title: entry
                        .attributes
                        .get("title")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                })
            })
            .collect();

        debug!(
            requested = k,
            returned = results.len(),
            metric = metric.as_str(),
            "Similarity search"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinegraph_vectors::{FlatIndex, IndexEntry};

    fn index(metric: DistanceMetric) -> Arc<PersistedIndex> {
        let mut flat = FlatIndex::new(2, metric);
        flat.add(&[vec![1.0, 0.0], vec![0.6, 0.8], vec![0.0, 1.0]])
            .unwrap();
        let entries = vec![
            IndexEntry::new("a"),
            IndexEntry::new("b"),
            IndexEntry::new("c"),
        ];
        Arc::new(PersistedIndex::new(flat, entries).unwrap())
    }

    #[test]
    fn test_at_most_k_and_no_sentinels() {
        let retriever = Retriever::new(
            index(DistanceMetric::InnerProduct),
            RetrievalConfig::default().with_k(50).with_min_similarity(None),
        );
        let hits = retriever.search(&[1.0, 0.0]).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "a");

        let two = retriever.search_k(&[1.0, 0.0], 2).unwrap();
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn test_unbounded_k_is_clamped_to_index_size() {
        let retriever = Retriever::new(
            index(DistanceMetric::InnerProduct),
            RetrievalConfig::default().with_min_similarity(None),
        );
        let ids: Vec<_> = retriever
            .search_k(&[1.0, 0.0], usize::MAX)
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_inner_product_cutoff_boundary() {
        // scores against [1, 0]: a = 1.0, b = 0.6, c = 0.0
        let exact = Retriever::new(
            index(DistanceMetric::InnerProduct),
            RetrievalConfig::default().with_min_similarity(Some(0.6)),
        );
        let ids: Vec<_> = exact
            .search(&[1.0, 0.0])
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        let stricter = Retriever::new(
            index(DistanceMetric::InnerProduct),
            RetrievalConfig::default().with_min_similarity(Some(0.61)),
        );
        assert_eq!(stricter.search(&[1.0, 0.0]).unwrap().len(), 1);
    }

    #[test]
    fn test_l2_cutoff_is_a_ceiling() {
        // squared distances from [1, 0]: a = 0.0, b = 0.8, c = 2.0
        let retriever = Retriever::new(
            index(DistanceMetric::L2),
            RetrievalConfig::default().with_min_similarity(Some(1.0)),
        );
        let ids: Vec<_> = retriever
            .search(&[1.0, 0.0])
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_zero_query_returns_nothing_above_cutoff() {
        let retriever = Retriever::new(
            index(DistanceMetric::InnerProduct),
            RetrievalConfig::default(),
        );
        assert!(retriever.search(&[0.0, 0.0]).unwrap().is_empty());
    }
}
