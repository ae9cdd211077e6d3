//! Deterministic local embedding backend.
//!
//! Hashes word and bigram features into a fixed number of buckets with a
//! signed weight, then L2-normalizes. No model files, no network; suitable
//! as the default backend and for tests.

use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::{EmbeddingError, TextEmbedder};

pub const LOCAL_HASH_BACKEND: &str = "local-hash-v1";

/// Smallest supported vector length.
pub const MIN_DIMENSIONS: usize = 8;

// Text with no word tokens still gets a stable, non-zero vector.
const EMPTY_FEATURE: &str = "<empty>";

lazy_static! {
    static ref WORD_PATTERN: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
}

/// Feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct LocalHashEmbedder {
    name: String,
    dimensions: usize,
}

impl LocalHashEmbedder {
    pub fn new(name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            dimensions: dimensions.max(MIN_DIMENSIONS),
        }
    }
}

impl TextEmbedder for LocalHashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0_f32; self.dimensions];

        for feature in features(text) {
            let hash = feature_hash(&feature);
            let index = (hash as usize) % self.dimensions;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            let weight = 1.0 + (((hash >> 48) & 0xFF) as f32 / 255.0);
            vector[index] += sign * weight;
        }

        normalize(&mut vector)?;
        Ok(vector)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn features(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect();

    if words.is_empty() {
        return vec![EMPTY_FEATURE.to_string()];
    }

    let mut features = Vec::with_capacity(words.len() * 2);
    for (index, word) in words.iter().enumerate() {
        features.push(format!("w:{word}"));
        if let Some(next) = words.get(index + 1) {
            features.push(format!("b:{word}_{next}"));
        }
    }
    features
}

/// First eight bytes of the SHA-256 digest, big-endian. Fixed across
/// toolchains, so scores stay comparable between builds.
fn feature_hash(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    let mut prefix = [0_u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

fn normalize(values: &mut [f32]) -> Result<(), EmbeddingError> {
    let norm = values
        .iter()
        .map(|value| f64::from(*value) * f64::from(*value))
        .sum::<f64>()
        .sqrt();

    // Opposite-signed features can cancel out exactly.
    if norm <= f64::EPSILON {
        return Err(EmbeddingError::ZeroNorm);
    }

    for value in values.iter_mut() {
        *value = (f64::from(*value) / norm) as f32;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_vectors_are_unit_length() {
        let embedder = LocalHashEmbedder::new("test", 64);
        let vector = embedder.embed("The image is not sharp.").unwrap();
        let norm: f64 = vector.iter().map(|v| f64::from(*v) * f64::from(*v)).sum();
        assert_eq!(vector.len(), 64);
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic() {
        let embedder = LocalHashEmbedder::new("test", 128);
        assert_eq!(
            embedder.embed("Background is not uniform").unwrap(),
            embedder.embed("Background is not uniform").unwrap()
        );
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = LocalHashEmbedder::new("test", 128);
        assert_eq!(
            embedder.embed("Eyes closed!").unwrap(),
            embedder.embed("eyes, CLOSED").unwrap()
        );
    }

    #[test]
    fn test_empty_text_has_vector() {
        let embedder = LocalHashEmbedder::new("test", 32);
        let vector = embedder.embed("").unwrap();
        assert!(vector.iter().any(|v| *v != 0.0));
        assert_eq!(vector, embedder.embed("  ...  ").unwrap());
    }

    #[test]
    fn test_related_text_scores_higher() {
        let embedder = LocalHashEmbedder::new("test", 384);
        let anchor = embedder.embed("The image is not sharp and blurry").unwrap();
        let close = embedder.embed("The image is blurry and not sharp").unwrap();
        let far = embedder.embed("Please remove sunglasses from the subject").unwrap();

        let close_score = cosine_similarity(&anchor, &close).unwrap();
        let far_score = cosine_similarity(&anchor, &far).unwrap();
        assert!(close_score > far_score);
    }

    #[test]
    fn test_feature_hash_is_pinned() {
        assert_eq!(feature_hash("w:image"), 12_621_629_377_134_047_444);
        assert_eq!(feature_hash("b:eyes_closed"), 14_197_166_997_423_524_995);
    }

    #[test]
    fn test_non_ascii_words_are_features() {
        assert_eq!(features("Müller"), vec!["w:müller".to_string()]);
        assert_eq!(features("背景"), vec!["w:背景".to_string()]);
    }

    #[test]
    fn test_unrelated_non_ascii_texts_differ() {
        let embedder = LocalHashEmbedder::new("test", 384);
        let cyrillic = embedder.embed("Изображение размыто, лицо не в фокусе").unwrap();
        let japanese = embedder.embed("背景が均一ではありません").unwrap();

        let score = cosine_similarity(&cyrillic, &japanese).unwrap();
        assert!(score < 0.99, "unrelated texts scored {score}");
    }

    #[test]
    fn test_minimum_dimensions() {
        assert_eq!(LocalHashEmbedder::new("tiny", 2).dimensions(), MIN_DIMENSIONS);
    }
}
