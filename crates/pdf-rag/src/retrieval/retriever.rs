//! Question-to-chunks retrieval

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::RetrievalResult;

use super::index::VectorIndex;

/// Embeds a question and searches the index with it
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            embedder,
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Retrieve the `top_k` chunks most similar to `question`.
    ///
    /// An empty index yields an empty result without calling the embedder.
    pub async fn retrieve(&self, index: &VectorIndex, question: &str) -> Result<RetrievalResult> {
        if index.is_empty() {
            tracing::debug!("Index is empty, skipping retrieval");
            return Ok(RetrievalResult::empty());
        }

        let query_identity = self.embedder.identity();
        if let Some(indexed) = index.identity() {
            if *indexed != query_identity {
                return Err(Error::EmbedderMismatch {
                    indexed: indexed.to_string(),
                    query: query_identity.to_string(),
                });
            }
        }

        let query = self.embedder.embed(question).await?;
        let result = index.search(&query, self.top_k)?;

        tracing::debug!(
            "Retrieved {} chunks (top similarity {:?})",
            result.len(),
            result.chunks.first().map(|c| c.similarity)
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimilarityMetric;
    use crate::providers::HashingEmbedder;
    use crate::types::{Chunk, ChunkSource, FileType};
    use uuid::Uuid;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let source = ChunkSource {
                    filename: format!("doc{}.pdf", i),
                    file_type: FileType::Pdf,
                    page_number: 1,
                    page_count: 1,
                };
                Chunk::new(Uuid::new_v4(), text.to_string(), source, 0, text.chars().count(), 0, 0)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_retrieve_finds_matching_chunk() {
        let embedder = Arc::new(HashingEmbedder::new(256).unwrap());
        let index = VectorIndex::build(
            chunks(&["The sky is blue.", "Grass is green in spring."]),
            embedder.as_ref(),
            16,
            SimilarityMetric::Cosine,
        )
        .await
        .unwrap();

        let retriever = Retriever::new(embedder, 1);
        let result = retriever.retrieve(&index, "What color is the sky?").await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.chunks[0].chunk.content, "The sky is blue.");
    }

    #[tokio::test]
    async fn test_rejects_different_embedder() {
        let index = VectorIndex::build(
            chunks(&["some text"]),
            &HashingEmbedder::new(64).unwrap(),
            16,
            SimilarityMetric::Cosine,
        )
        .await
        .unwrap();

        let retriever = Retriever::new(Arc::new(HashingEmbedder::new(128).unwrap()), 4);
        let err = retriever.retrieve(&index, "text").await.unwrap_err();
        assert!(matches!(err, Error::EmbedderMismatch { .. }));
    }

    #[tokio::test]
    async fn test_empty_index() {
        let retriever = Retriever::new(Arc::new(HashingEmbedder::new(64).unwrap()), 4);
        let result = retriever
            .retrieve(&VectorIndex::empty(), "anything")
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
