//! Ingestion pipeline orchestration

use std::path::Path;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::Chunk;

use super::chunker::TextChunker;
use super::loader::{DocumentLoader, LoadOutcome, LoadWarning, UploadedFile};

/// Chunks produced from one batch of files, ready for indexing
#[derive(Debug, Default)]
pub struct IngestedBatch {
    /// Chunks in document then page order
    pub chunks: Vec<Chunk>,
    /// Files that were skipped
    pub warnings: Vec<LoadWarning>,
    /// Number of documents that loaded
    pub documents: usize,
    /// Number of pages across those documents
    pub pages: usize,
}

/// Load + chunk
#[derive(Clone, Default)]
pub struct IngestPipeline {
    loader: DocumentLoader,
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(loader: DocumentLoader, chunker: TextChunker) -> Self {
        Self { loader, chunker }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(DocumentLoader::default(), TextChunker::from_config(config))
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Load and chunk every matching file under a directory
    pub fn ingest_directory(&self, dir: &Path) -> Result<IngestedBatch> {
        let outcome = self.loader.load_directory(dir)?;
        Ok(self.chunk_outcome(outcome))
    }

    /// Load and chunk uploaded files
    pub fn ingest_files(&self, files: &[UploadedFile]) -> IngestedBatch {
        let outcome = self.loader.load_files(files);
        self.chunk_outcome(outcome)
    }

    /// Documents are dropped here; only their chunks move on
    fn chunk_outcome(&self, outcome: LoadOutcome) -> IngestedBatch {
        let chunks = self.chunker.chunk_documents(&outcome.documents);

        tracing::info!(
            "Chunked {} documents ({} pages) into {} chunks, {} files skipped",
            outcome.documents.len(),
            outcome.page_count(),
            chunks.len(),
            outcome.warnings.len()
        );

        IngestedBatch {
            documents: outcome.documents.len(),
            pages: outcome.page_count(),
            chunks,
            warnings: outcome.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_uploads() {
        let pipeline = IngestPipeline::from_config(&ChunkingConfig {
            chunk_size: 50,
            chunk_overlap: 10,
        });
        let batch = pipeline.ingest_files(&[
            UploadedFile::new("a.txt", "One short line."),
            UploadedFile::new("b.md", "word ".repeat(30)),
            UploadedFile::new("c.pdf", b"%PDF-1.4 corrupt".to_vec()),
        ]);

        assert_eq!(batch.documents, 2);
        assert_eq!(batch.pages, 2);
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.chunks[0].content, "One short line.");
        assert!(batch.chunks.len() > 2);
        assert!(batch.chunks.iter().all(|c| c.char_len() <= 50));
    }
}
