//! Offline embeddings using feature hashing
//!
//! Each token is hashed into a fixed bucket and the term-frequency vector is
//! L2-normalized. The same text always maps to the same vector, so no
//! vocabulary or network access is needed.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

const MODEL_NAME: &str = "feature-hash-v1";

/// Deterministic bag-of-words embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("hashing embedder needs at least one dimension"));
        }
        Ok(Self { dimensions })
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.dimensions
    }

    /// Embed synchronously; empty text yields the zero vector
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut tf = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            tf[self.bucket(&token.to_lowercase())] += 1.0;
        }

        let norm: f32 = tf.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut tf {
                *x /= norm;
            }
        }
        tf
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }

    fn model(&self) -> &str {
        MODEL_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_normalized_and_stable() {
        let embedder = HashingEmbedder::new(256).unwrap();
        let a = embedder.embed_text("Hello world, this is a test");
        let b = embedder.embed_text("hello WORLD this is a test");

        assert_eq!(a.len(), 256);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(32).unwrap();
        assert!(embedder.embed_text("  ...  ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn test_identity() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let identity = embedder.identity();
        assert_eq!(identity.to_string(), "hashing/feature-hash-v1@64");
    }
}
