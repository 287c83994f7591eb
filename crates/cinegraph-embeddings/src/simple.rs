//! Feature-hashing embedder (no model required).
//!
//! Words are hashed into a fixed-dimension space with several signed hash
//! functions. Texts that share words land close together, which is enough
//! for offline indexing, demos and tests.

use crate::{Embedder, EmbeddingError, EmbeddingResult};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic hash-based embedder.
///
/// # Example
///
/// ```rust
/// use cinegraph_embeddings::{Embedder, HashEmbedder};
///
/// let embedder = HashEmbedder::new(128);
/// let vec = embedder.embed("heist movie").unwrap();
/// assert_eq!(vec.len(), 128);
/// ```
pub struct HashEmbedder {
    dimension: usize,
    num_hashes: usize,
}

impl HashEmbedder {
    /// Create a new hash embedder with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            num_hashes: 4,
        }
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 1)
            .map(|s| s.to_string())
            .collect()
    }

    fn hash_with_seed(&self, word: &str, seed: u64) -> usize {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        word.hash(&mut hasher);
        (hasher.finish() as usize) % self.dimension
    }

    fn sign_hash(&self, word: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        (seed + 1000).hash(&mut hasher);
        word.hash(&mut hasher);
        if hasher.finish() % 2 == 0 {
            1.0
        } else {
            -1.0
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];
        let tokens = self.tokenize(text);

        for token in &tokens {
            for seed in 0..self.num_hashes as u64 {
                let idx = self.hash_with_seed(token, seed);
                vector[idx] += self.sign_hash(token, seed);
            }
        }

        crate::normalize_l2(&mut vector);
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "feature-hash"
    }
}
