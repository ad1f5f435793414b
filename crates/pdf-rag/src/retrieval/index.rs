//! Exact in-memory vector index over chunk embeddings

use crate::config::SimilarityMetric;
use crate::error::{Error, Result};
use crate::providers::{EmbedderIdentity, EmbeddingProvider};
use crate::types::{Chunk, RetrievalResult, ScoredChunk};

/// A chunk and its embedding
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Flat vector index, searched exhaustively.
///
/// An index is built in one pass from a chunk sequence and never mutated
/// afterwards; re-ingestion builds a new index and swaps it in.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    identity: Option<EmbedderIdentity>,
    metric: SimilarityMetric,
}

impl VectorIndex {
    /// An index with no entries; every search returns an empty result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Embed every chunk and build an index.
    ///
    /// Any embedding failure fails the whole build, so a partial index is
    /// never returned.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        batch_size: usize,
        metric: SimilarityMetric,
    ) -> Result<Self> {
        let identity = embedder.identity();
        let expected = identity.dimensions;
        let batch_size = batch_size.max(1);

        tracing::info!(
            "Embedding {} chunks with {} (batch size {})",
            chunks.len(),
            identity,
            batch_size
        );

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embedded = embedder.embed_batch(&texts).await?;

            if embedded.len() != texts.len() {
                return Err(Error::embedding(format!(
                    "batch {} returned {} vectors for {} chunks",
                    batch_no,
                    embedded.len(),
                    texts.len()
                )));
            }
            for vector in &embedded {
                if vector.len() != expected {
                    return Err(Error::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                if vector.iter().any(|x| !x.is_finite()) {
                    return Err(Error::embedding(format!(
                        "batch {} contains a non-finite vector component",
                        batch_no
                    )));
                }
            }
            tracing::debug!("Embedded batch {} ({} chunks)", batch_no, texts.len());
            vectors.extend(embedded);
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        Ok(Self {
            entries,
            identity: Some(identity),
            metric,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Embedder the index was built with, `None` for an empty index
    pub fn identity(&self) -> Option<&EmbedderIdentity> {
        self.identity.as_ref()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Return the `k` entries most similar to `query`, most similar first.
    ///
    /// Equal scores keep insertion order. A score that is NaN ranks last.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if self.entries.is_empty() || k == 0 {
            return Ok(RetrievalResult::empty());
        }
        if let Some(identity) = &self.identity {
            if query.len() != identity.dimensions {
                return Err(Error::DimensionMismatch {
                    expected: identity.dimensions,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, rank_score(similarity(self.metric, query, &entry.vector))))
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let chunks = scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                similarity: score,
            })
            .collect();

        Ok(RetrievalResult::new(chunks))
    }
}

fn rank_score(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// Score two vectors under `metric`; higher is more similar
pub fn similarity(metric: SimilarityMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        SimilarityMetric::Cosine => cosine_similarity(a, b),
        SimilarityMetric::DotProduct => dot(a, b),
        SimilarityMetric::Euclidean => -euclidean_distance(a, b),
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity, 0 when either vector is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashingEmbedder;
    use crate::types::{ChunkSource, FileType};
    use async_trait::async_trait;
    use uuid::Uuid;

    fn chunk(text: &str) -> Chunk {
        let source = ChunkSource {
            filename: "doc.pdf".to_string(),
            file_type: FileType::Pdf,
            page_number: 1,
            page_count: 1,
        };
        let len = text.chars().count();
        Chunk::new(Uuid::new_v4(), text.to_string(), source, 0, len, 0, 0)
    }

    /// Maps the first character to a fixed axis
    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(match text.chars().next() {
                Some('a') => vec![1.0, 0.0],
                Some('b') => vec![0.0, 1.0],
                _ => vec![0.7, 0.7],
            })
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
        fn name(&self) -> &str {
            "axis"
        }
        fn model(&self) -> &str {
            "axis-v1"
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::embedding("quota exceeded"))
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }
        fn name(&self) -> &str {
            "broken"
        }
        fn model(&self) -> &str {
            "none"
        }
    }

    #[test]
    fn test_similarity_functions() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(similarity(SimilarityMetric::DotProduct, &[2.0, 1.0], &[3.0, 4.0]), 10.0);
        assert_eq!(similarity(SimilarityMetric::Euclidean, &[0.0, 0.0], &[3.0, 4.0]), -5.0);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let chunks = vec![chunk("b first"), chunk("a second"), chunk("c third")];
        let index = VectorIndex::build(chunks, &AxisEmbedder, 2, SimilarityMetric::Cosine)
            .await
            .unwrap();

        let result = index.search(&[1.0, 0.0], 2).unwrap();
        let texts: Vec<&str> = result.texts().collect();
        assert_eq!(texts, vec!["a second", "c third"]);
        assert!(result.chunks[0].similarity >= result.chunks[1].similarity);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let chunks = vec![chunk("a one"), chunk("b two"), chunk("a three"), chunk("a four")];
        let index = VectorIndex::build(chunks, &AxisEmbedder, 8, SimilarityMetric::DotProduct)
            .await
            .unwrap();

        let result = index.search(&[1.0, 0.0], 3).unwrap();
        let texts: Vec<&str> = result.texts().collect();
        assert_eq!(texts, vec!["a one", "a three", "a four"]);
    }

    #[tokio::test]
    async fn test_k_larger_than_index() {
        let index = VectorIndex::build(vec![chunk("a only")], &AxisEmbedder, 4, SimilarityMetric::Cosine)
            .await
            .unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_index_returns_empty_result() {
        let index = VectorIndex::empty();
        assert!(index.search(&[1.0, 0.0], 4).unwrap().is_empty());
        assert!(index.identity().is_none());
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_build() {
        let result =
            VectorIndex::build(vec![chunk("a")], &BrokenEmbedder, 4, SimilarityMetric::Cosine).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    /// Returns NaN for text starting with 'n'
    struct NanEmbedder;

    #[async_trait]
    impl EmbeddingProvider for NanEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            match text.chars().next() {
                Some('n') => Ok(vec![f32::NAN, 0.0]),
                _ => AxisEmbedder.embed(text).await,
            }
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
        fn name(&self) -> &str {
            "nan"
        }
        fn model(&self) -> &str {
            "nan-v1"
        }
    }

    #[tokio::test]
    async fn test_non_finite_vector_fails_build() {
        let chunks = vec![chunk("a fine"), chunk("n broken")];
        let result = VectorIndex::build(chunks, &NanEmbedder, 4, SimilarityMetric::Cosine).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_nan_score_ranks_last() {
        let entry = |text: &str, vector: Vec<f32>| IndexEntry {
            chunk: chunk(text),
            vector,
        };
        let index = VectorIndex {
            entries: vec![
                entry("low", vec![0.1, 1.0]),
                entry("nan", vec![f32::NAN, 0.0]),
                entry("high", vec![1.0, 0.0]),
            ],
            identity: None,
            metric: SimilarityMetric::Cosine,
        };

        let result = index.search(&[1.0, 0.0], 3).unwrap();
        let texts: Vec<&str> = result.texts().collect();
        assert_eq!(texts, vec!["high", "low", "nan"]);
        assert_eq!(result.chunks[2].similarity, f32::NEG_INFINITY);
    }

    #[test]
    fn test_overflowing_dot_product_still_ranks() {
        let index = VectorIndex {
            entries: vec![
                IndexEntry {
                    chunk: chunk("overflow"),
                    vector: vec![f32::MAX, -f32::MAX],
                },
                IndexEntry {
                    chunk: chunk("plain"),
                    vector: vec![1.0, 1.0],
                },
            ],
            identity: None,
            metric: SimilarityMetric::DotProduct,
        };

        let result = index.search(&[2.0, 2.0], 2).unwrap();
        let texts: Vec<&str> = result.texts().collect();
        assert_eq!(texts, vec!["plain", "overflow"]);
    }

    #[tokio::test]
    async fn test_query_dimension_checked() {
        let index = VectorIndex::build(vec![chunk("a")], &AxisEmbedder, 4, SimilarityMetric::Cosine)
            .await
            .unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_near_duplicate_query_is_recalled() {
        let embedder = HashingEmbedder::new(512).unwrap();
        let chunks = vec![
            chunk("Quarterly revenue grew by twelve percent."),
            chunk("The mitochondria is the powerhouse of the cell."),
            chunk("Rust guarantees memory safety without a garbage collector."),
        ];
        let index = VectorIndex::build(chunks, &embedder, 2, SimilarityMetric::Cosine)
            .await
            .unwrap();

        let query = embedder.embed_text("the mitochondria is the powerhouse of a cell");
        let result = index.search(&query, 1).unwrap();
        assert!(result.chunks[0].chunk.content.contains("mitochondria"));
    }
}
