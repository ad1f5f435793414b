//! Retrieval and answer types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::Chunk;

/// A chunk paired with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Similarity under the index metric (higher is more similar)
    pub similarity: f32,
}

/// Ranked chunks returned for one query, most similar first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunks: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn new(chunks: Vec<ScoredChunk>) -> Self {
        Self { chunks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Chunk texts in retrieved order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.chunk.content.as_str())
    }
}

/// Citation from a source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Document ID
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Page number
    pub page_number: u32,
    /// Exact snippet from the source
    pub snippet: String,
    /// Similarity score
    pub similarity_score: f32,
}

impl Citation {
    /// Create a citation from a scored chunk
    pub fn from_scored(scored: &ScoredChunk) -> Self {
        let chunk = &scored.chunk;
        Self {
            chunk_id: chunk.id,
            document_id: chunk.document_id,
            filename: chunk.source.filename.clone(),
            page_number: chunk.source.page_number,
            snippet: truncate_snippet(&chunk.content, 200),
            similarity_score: scored.similarity,
        }
    }

    /// Format citation for display in text
    pub fn format_inline(&self) -> String {
        format!("[{}, Page {}]", self.filename, self.page_number)
    }
}

/// A synthesized answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The question that was asked
    pub question: String,
    /// Raw model output
    pub text: String,
    /// Sources the answer was grounded in, in retrieved order
    pub citations: Vec<Citation>,
    /// Model that produced the answer
    pub model: String,
}

impl Answer {
    /// Whether any context was available to the model
    pub fn is_grounded(&self) -> bool {
        !self.citations.is_empty()
    }
}

/// Truncate a snippet to at most `max_chars` characters, adding an ellipsis
pub fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    match snippet.char_indices().nth(max_chars) {
        None => snippet.to_string(),
        Some((end, _)) => {
            let cut = snippet[..end]
                .rfind(char::is_whitespace)
                .filter(|&pos| pos > 0)
                .unwrap_or(end);
            format!("{}...", snippet[..cut].trim_end())
        }
    }
}
