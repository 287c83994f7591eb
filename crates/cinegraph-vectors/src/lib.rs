//! # Cinegraph Vectors
//!
//! A flat (brute-force) vector index persisted as two files:
//!
//! | File | Format | Content |
//! |------|--------|---------|
//! | `movie_index.bin` | bincode | save stamp, metric, dimension, row-major vectors |
//! | `movies_list.json` | JSON | `{stamp, entries: [{id, attributes}]}`, one entry per index row |
//!
//! Row `i` of the index belongs to entry `i` of the list. The pair is only ever
//! written and loaded together through [`PersistedIndex`], which refuses a pair
//! whose stamps or lengths disagree.
//!
//! ## Quick Start
//!
//! ```rust
//! use cinegraph_vectors::{DistanceMetric, FlatIndex, NO_MATCH};
//!
//! let mut index = FlatIndex::new(2, DistanceMetric::InnerProduct);
//! index.add(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//!
//! let hits = index.search(&[1.0, 0.0], 3).unwrap();
//! let labels: Vec<i64> = hits.slots().map(|(label, _)| label).collect();
//! assert_eq!(labels, vec![0, 1, NO_MATCH]);
//! ```

pub mod flat;
pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use flat::{FlatIndex, SearchHits, NO_MATCH};
pub use store::{IndexEntry, IndexPaths, PersistedIndex};

/// Errors that can occur when working with the vector index.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index not found: {0}")]
    NotFound(String),

    #[error("Index is corrupt: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for vector operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// Distance metric for similarity search.
///
/// `InnerProduct` reports a similarity (higher is closer) and expects
/// L2-normalized vectors, which makes it cosine similarity. `L2` reports a
/// squared Euclidean distance (lower is closer).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    InnerProduct,
    L2,
}

impl DistanceMetric {
    /// Whether vectors must be L2-normalized before insertion and search.
    pub fn requires_normalization(&self) -> bool {
        matches!(self, DistanceMetric::InnerProduct)
    }

    /// Whether score `a` is strictly closer than score `b`.
    pub fn is_closer(&self, a: f32, b: f32) -> bool {
        match self {
            DistanceMetric::InnerProduct => a > b,
            DistanceMetric::L2 => a < b,
        }
    }

    /// Whether a hit with `score` survives `cutoff`.
    ///
    /// Inner product keeps `score >= cutoff`; L2 keeps `score <= cutoff`.
    pub fn passes(&self, score: f32, cutoff: f32) -> bool {
        match self {
            DistanceMetric::InnerProduct => score >= cutoff,
            DistanceMetric::L2 => score <= cutoff,
        }
    }

    /// Score reported for padded "no match" slots.
    pub fn worst_score(&self) -> f32 {
        match self {
            DistanceMetric::InnerProduct => f32::NEG_INFINITY,
            DistanceMetric::L2 => f32::INFINITY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::InnerProduct => "inner_product",
            DistanceMetric::L2 => "l2",
        }
    }
}
