//! Text-embedding collaborator abstraction.
//!
//! The evaluator only depends on the [`TextEmbedder`] contract: text in,
//! fixed-length vector out. Backends are constructed once and shared by
//! reference for the lifetime of the process.

use thiserror::Error;

mod factory;
mod local;

pub use factory::{EmbedderFactory, EmbedderRegistry, LocalHashEmbedderFactory};
pub use local::{LocalHashEmbedder, LOCAL_HASH_BACKEND, MIN_DIMENSIONS};

/// Failures of the embedding collaborator.
///
/// These are fatal for a comparison: a malformed vector is never turned
/// into a similarity of zero.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("Embedding backend failed: {0}")]
    Backend(String),

    #[error("Embedding backend returned an empty vector")]
    EmptyVector,

    #[error("Embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Embedding contains a non-finite component at index {0}")]
    NonFinite(usize),

    #[error("Embedding has zero norm")]
    ZeroNorm,
}

/// Encodes text into a fixed-length vector.
///
/// Implementations must be deterministic for a fixed model and safe for
/// concurrent read access.
pub trait TextEmbedder: Send + Sync {
    /// Encode one text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Backend/model name for logs.
    fn name(&self) -> &str;

    /// Length of the vectors this embedder produces.
    fn dimensions(&self) -> usize;
}

/// Cosine similarity of two embeddings, computed in `f64`.
///
/// Vectors that are empty, of different lengths, contain NaN/infinity or
/// have zero norm are rejected rather than scored.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f64, EmbeddingError> {
    if left.is_empty() || right.is_empty() {
        return Err(EmbeddingError::EmptyVector);
    }
    if left.len() != right.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let (mut dot, mut norm_left, mut norm_right) = (0.0f64, 0.0f64, 0.0f64);
    for (index, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        if !l.is_finite() || !r.is_finite() {
            return Err(EmbeddingError::NonFinite(index));
        }
        let (l, r) = (f64::from(*l), f64::from(*r));
        dot += l * r;
        norm_left += l * l;
        norm_right += r * r;
    }

    let denominator = norm_left.sqrt() * norm_right.sqrt();
    if denominator <= f64::EPSILON {
        return Err(EmbeddingError::ZeroNorm);
    }

    Ok(dot / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -0.4, 0.5];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unnormalized_inputs() {
        let score = cosine_similarity(&[2.0, 0.0], &[5.0, 5.0]).unwrap();
        assert!((score - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_vectors_are_errors() {
        assert_eq!(cosine_similarity(&[], &[1.0]), Err(EmbeddingError::EmptyVector));
        assert_eq!(
            cosine_similarity(&[1.0], &[1.0, 2.0]),
            Err(EmbeddingError::DimensionMismatch { left: 1, right: 2 })
        );
        assert_eq!(
            cosine_similarity(&[1.0, f32::NAN], &[1.0, 1.0]),
            Err(EmbeddingError::NonFinite(1))
        );
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), Err(EmbeddingError::ZeroNorm));
    }
}
