//! Brute-force vector index.
//!
//! Search semantics follow flat FAISS indexes: a search for `k` neighbours
//! always reports exactly `k` slots, nearest first, and slots beyond the
//! number of stored vectors carry the [`NO_MATCH`] label. Those padding slots
//! are counted, not stored, so `k` may exceed the index size by any amount.

use crate::{DistanceMetric, VectorError, VectorResult};
use serde::{Deserialize, Serialize};

/// Label of a result slot that holds no vector.
pub const NO_MATCH: i64 = -1;

/// Raw search output: parallel score and label arrays for the stored rows
/// that made the cut, followed by `padding` [`NO_MATCH`] slots.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    pub scores: Vec<f32>,
    pub labels: Vec<i64>,
    padding: usize,
    fill: f32,
}

impl SearchHits {
    /// Number of slots, padding included. Equals the requested `k`.
    pub fn len(&self) -> usize {
        self.labels.len().saturating_add(self.padding)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every `(label, score)` slot, padding included.
    pub fn slots(&self) -> impl Iterator<Item = (i64, f32)> + '_ {
        self.labels
            .iter()
            .copied()
            .zip(self.scores.iter().copied())
            .chain(std::iter::repeat((NO_MATCH, self.fill)).take(self.padding))
    }

    /// Iterate over `(row, score)` pairs, skipping [`NO_MATCH`] slots.
    pub fn matches(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.labels
            .iter()
            .zip(self.scores.iter())
            .filter(|(label, _)| **label != NO_MATCH && **label >= 0)
            .map(|(label, score)| (*label as usize, *score))
    }
}

/// Flat index over row-major `f32` vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    metric: DistanceMetric,
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            metric,
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored vector at `row`.
    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        let start = row.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Append vectors. Rows are numbered in insertion order.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> VectorResult<()> {
        for vector in vectors {
            self.check(vector)?;
        }
        for vector in vectors {
            self.data.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Return the `k` nearest rows to `query`, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> VectorResult<SearchHits> {
        self.check(query)?;

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .filter_map(|row| self.vector(row).map(|v| (row, self.score(query, v))))
            .collect();

        let metric = self.metric;
        scored.sort_by(|a, b| {
            let ord = if metric.is_closer(a.1, b.1) {
                std::cmp::Ordering::Less
            } else if metric.is_closer(b.1, a.1) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            };
            ord.then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        let (labels, scores) = scored
            .into_iter()
            .map(|(row, score)| (row as i64, score))
            .unzip::<_, _, Vec<i64>, Vec<f32>>();
        Ok(SearchHits {
            padding: k - labels.len(),
            fill: metric.worst_score(),
            scores,
            labels,
        })
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            DistanceMetric::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum(),
        }
    }

    fn check(&self, vector: &[f32]) -> VectorResult<()> {
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatIndex {
        let mut index = FlatIndex::new(3, DistanceMetric::InnerProduct);
        index
            .add(&[
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.7071, 0.7071, 0.0],
            ])
            .unwrap();
        index
    }

    #[test]
    fn test_inner_product_search() {
        let index = sample();
        let hits = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(hits.labels, vec![0, 2]);
        assert!((hits.scores[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_padding_with_sentinel() {
        let index = sample();
        let hits = index.search(&[0.0, 1.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 5);
        let labels: Vec<i64> = hits.slots().map(|(label, _)| label).collect();
        assert_eq!(&labels[3..], &[NO_MATCH, NO_MATCH]);
        assert!(hits.slots().skip(3).all(|(_, score)| score == f32::NEG_INFINITY));
        assert_eq!(hits.matches().count(), 3);
        assert!(hits.matches().all(|(row, _)| row < 3));
    }

    #[test]
    fn test_huge_k_does_not_allocate_padding() {
        let index = sample();
        let hits = index.search(&[1.0, 0.0, 0.0], usize::MAX).unwrap();
        assert_eq!(hits.len(), usize::MAX);
        assert_eq!(hits.labels, vec![0, 2, 1]);
        assert_eq!(hits.scores.len(), 3);
        assert_eq!(hits.matches().count(), 3);

        let hits = index.search(&[1.0, 0.0, 0.0], 5_000_000).unwrap();
        assert!(hits.labels.capacity() <= 3);
        assert_eq!(hits.slots().nth(3), Some((NO_MATCH, f32::NEG_INFINITY)));
    }

    #[test]
    fn test_l2_search_nearest_first() {
        let mut index = FlatIndex::new(2, DistanceMetric::L2);
        index
            .add(&[vec![10.0, 0.0], vec![0.1, 0.0], vec![3.0, 4.0]])
            .unwrap();

        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits.labels, vec![1, 2, 0]);
        assert!((hits.scores[1] - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = FlatIndex::new(3, DistanceMetric::InnerProduct);
        let result = index.add(&[vec![1.0, 0.0]]);
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
        assert!(index.is_empty());

        assert!(sample().search(&[1.0], 1).is_err());
    }

    #[test]
    fn test_empty_index_returns_only_sentinels() {
        let index = FlatIndex::new(2, DistanceMetric::InnerProduct);
        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert!(hits.labels.is_empty());
        assert_eq!(
            hits.slots().map(|(label, _)| label).collect::<Vec<_>>(),
            vec![NO_MATCH, NO_MATCH]
        );
        assert_eq!(hits.matches().count(), 0);
    }
}
