//! Core embedder trait and types.

use thiserror::Error;

/// Embedding error types.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Core trait for embedding providers.
///
/// Calls are synchronous and may block on network I/O; async callers should
/// run them on a blocking thread.
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed multiple texts in a batch.
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;

    /// Reject vectors that do not match [`Embedder::dimension`].
    fn check_dimension(&self, vector: &[f32]) -> EmbeddingResult<()> {
        if vector.len() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                got: vector.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl Embedder for Fixed {
        fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_default_batch_preserves_order() {
        let batch = Fixed.embed_batch(&["a", "abc"]).unwrap();
        assert_eq!(batch, vec![vec![1.0, 1.0], vec![3.0, 1.0]]);
    }

    #[test]
    fn test_check_dimension() {
        assert!(Fixed.check_dimension(&[0.0, 0.0]).is_ok());
        assert!(matches!(
            Fixed.check_dimension(&[0.0]),
            Err(EmbeddingError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }
}
