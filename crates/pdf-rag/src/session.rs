//! Processing session owning one vector index
//!
//! Ingestion takes `&mut self` and questions take `&self`, so the borrow
//! checker keeps a session from being re-indexed while it is answering.
//! Sessions share nothing; concurrent users each create their own.

use std::path::Path;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::ingestion::{IngestPipeline, IngestedBatch, LoadWarning, UploadedFile};
use crate::pipeline::QueryPipeline;
use crate::providers::{self, EmbeddingProvider, LanguageModel};
use crate::retrieval::VectorIndex;
use crate::types::{Answer, RetrievalResult};

/// Summary of one ingestion run
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    /// One entry per file that was skipped
    pub warnings: Vec<LoadWarning>,
}

/// One ingested document set and the pipeline to query it
pub struct Session {
    config: RagConfig,
    ingest: IngestPipeline,
    query: QueryPipeline,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LanguageModel>,
    index: VectorIndex,
}

impl Session {
    /// Create a session with explicit providers; the index starts empty
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ingest: IngestPipeline::from_config(&config.chunking),
            query: QueryPipeline::from_config(&config, embedder.clone(), llm.clone()),
            config,
            embedder,
            llm,
            index: VectorIndex::empty(),
        })
    }

    /// Create a session with providers chosen by the configuration
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let embedder = providers::build_embedder(&config)?;
        let llm = providers::build_language_model(&config)?;
        Self::new(config, embedder, llm)
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn language_model(&self) -> &Arc<dyn LanguageModel> {
        &self.llm
    }

    /// Load every PDF under `dir` and replace the index with it.
    ///
    /// Unreadable files become warnings. If embedding fails the previous
    /// index is kept and the error is returned.
    pub async fn ingest_directory(&mut self, dir: &Path) -> Result<IngestReport> {
        if !dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("document directory not found: {}", dir.display()),
            )));
        }

        let ingest = self.ingest.clone();
        let dir = dir.to_path_buf();
        let batch = tokio::task::spawn_blocking(move || ingest.ingest_directory(&dir))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        self.replace_index(batch).await
    }

    /// Ingest in-memory uploads and replace the index with them
    pub async fn ingest_files(&mut self, files: Vec<UploadedFile>) -> Result<IngestReport> {
        let ingest = self.ingest.clone();
        let batch = tokio::task::spawn_blocking(move || ingest.ingest_files(&files))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?;

        self.replace_index(batch).await
    }

    async fn replace_index(&mut self, batch: IngestedBatch) -> Result<IngestReport> {
        let chunk_count = batch.chunks.len();
        if batch.documents == 0 {
            tracing::warn!("No documents could be loaded, the index will be empty");
        }

        let index = VectorIndex::build(
            batch.chunks,
            self.embedder.as_ref(),
            self.config.embeddings.batch_size,
            self.config.retrieval.metric,
        )
        .await?;

        self.index = index;
        tracing::info!(
            "Indexed {} chunks from {} documents",
            chunk_count,
            batch.documents
        );

        Ok(IngestReport {
            documents: batch.documents,
            pages: batch.pages,
            chunks: chunk_count,
            warnings: batch.warnings,
        })
    }

    /// Answer one question against the current index
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::config("question must not be empty"));
        }
        tracing::info!("Answering question against {} chunks", self.index.len());
        self.query.answer(&self.index, question).await
    }

    /// Retrieval only, without calling the model
    pub async fn retrieve(&self, question: &str) -> Result<RetrievalResult> {
        self.query.retrieve(&self.index, question).await
    }

    /// Drop the current index
    pub fn clear(&mut self) {
        self.index = VectorIndex::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashingEmbedder;
    use async_trait::async_trait;

    struct EchoLlm;

    #[async_trait]
    impl LanguageModel for EchoLlm {
        async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
            Ok(format!("{} chars of prompt", prompt.len()))
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
        fn name(&self) -> &str {
            "echo"
        }
        fn model(&self) -> &str {
            "echo"
        }
    }

    fn session() -> Session {
        Session::new(
            RagConfig::default(),
            Arc::new(HashingEmbedder::new(64).unwrap()),
            Arc::new(EchoLlm),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ingest_text_uploads_and_clear() {
        let mut session = session();
        let report = session
            .ingest_files(vec![
                UploadedFile::new("notes.txt", "Plain text is not a PDF but the registry knows it."),
                UploadedFile::new("junk.bin", vec![0u8, 1, 2]),
            ])
            .await
            .unwrap();

        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(session.index().len(), 1);

        session.clear();
        assert!(session.index().is_empty());
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let session = session();
        assert!(matches!(session.ask("   ").await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let mut session = session();
        let result = session
            .ingest_directory(Path::new("/definitely/not/here"))
            .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = 5000;
        let result = Session::new(
            config,
            Arc::new(HashingEmbedder::new(8).unwrap()),
            Arc::new(EchoLlm),
        );
        assert!(result.is_err());
    }
}
