//! Fixed local embedding function
//!
//! A deterministic hashed bag-of-tokens embedding: no model download, no
//! network, stable across runs. Good enough for lexical-overlap retrieval;
//! the `Embedder` trait is the seam where a neural backend would plug in.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const DEFAULT_DIMENSION: usize = 384;

pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    /// Embed one text into a vector of `dimension()` floats. Must be
    /// deterministic: equal inputs produce equal vectors.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Hashed bag-of-tokens embedder with signed buckets, L2-normalized.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

fn hash_token(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = hash_token(token);
            let bucket = (hash % self.dimension as u64) as usize;
            // one hash bit picks the sign, so unrelated tokens sharing a
            // bucket partially cancel instead of piling up
            let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let embedder = HashingEmbedder::default();
        assert_eq!(embedder.embed("Python is great"), embedder.embed("Python is great"));
    }

    #[test]
    fn embedding_is_normalized() {
        let embedder = HashingEmbedder::default();
        let norm: f32 = embedder
            .embed("some text to embed")
            .iter()
            .map(|v| v * v)
            .sum::<f32>()
            .sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_the_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed("").iter().all(|&v| v == 0.0));
    }

    #[test]
    fn shared_tokens_reduce_distance() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("Python");
        let near = embedder.embed("Python is great");
        let far = embedder.embed("Java is great");

        let dist = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
        };
        assert!(dist(&query, &near) < dist(&query, &far));
    }
}
