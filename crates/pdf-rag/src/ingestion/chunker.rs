//! Text chunking with page and position tracking

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkSource, Document};

/// Character span of a chunk within its page text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Characters shared with the previous span
    pub overlap: usize,
}

/// Splits page text into overlapping chunks of bounded size.
///
/// Every chunk is an exact slice of the page: chunk `i + 1` starts exactly
/// `overlap` characters before chunk `i` ends, so dropping each chunk's
/// leading overlap and concatenating restores the page text. Cut points are
/// chosen at a paragraph break, then a line break, then a sentence boundary,
/// then whitespace, and only then mid-word.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. The overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk every page of every document, preserving document and page order
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.chunk_document(doc)).collect()
    }

    /// Chunk a single document page by page
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in &doc.pages {
            if page.is_blank() {
                continue;
            }
            let source = ChunkSource::for_page(doc, page);
            let bounds = char_bounds(&page.content);

            for span in self.split_spans(&page.content) {
                let content = page.content[bounds[span.start]..bounds[span.end]].to_string();
                chunks.push(Chunk::new(
                    doc.id,
                    content,
                    source.clone(),
                    span.start,
                    span.end,
                    span.overlap,
                    chunks.len() as u32,
                ));
            }
        }

        tracing::debug!(
            "{}: {} pages -> {} chunks",
            doc.filename,
            doc.pages.len(),
            chunks.len()
        );
        chunks
    }

    /// Split text into chunk strings
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let bounds = char_bounds(text);
        self.split_spans(text)
            .into_iter()
            .map(|span| &text[bounds[span.start]..bounds[span.end]])
            .collect()
    }

    /// Compute chunk spans (in characters) for a text
    pub fn split_spans(&self, text: &str) -> Vec<Span> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let bounds = char_bounds(text);
        let total = bounds.len() - 1;
        let mut spans = Vec::new();
        let mut start = 0usize;
        let mut overlap = 0usize;

        loop {
            if total - start <= self.chunk_size {
                spans.push(Span { start, end: total, overlap });
                break;
            }

            let end = self.find_break(text, &bounds, start);
            spans.push(Span { start, end, overlap });
            start = end - self.overlap;
            overlap = self.overlap;
        }

        spans
    }

    /// Pick the end of a chunk starting at `start`.
    ///
    /// The end is kept past `start + overlap` so the next chunk always advances.
    fn find_break(&self, text: &str, bounds: &[usize], start: usize) -> usize {
        let hard = start + self.chunk_size;
        let min = start + self.overlap + 1;
        let window_start = bounds[min];
        let window = &text[window_start..bounds[hard]];

        let to_char = |byte_in_window: usize| -> usize {
            let abs = window_start + byte_in_window;
            bounds.binary_search(&abs).unwrap_or_else(|i| i)
        };

        // Paragraph, then line
        for separator in ["\n\n", "\n"] {
            if let Some(pos) = window.rfind(separator) {
                return to_char(pos + separator.len());
            }
        }

        // Sentence start (the first index is just the window edge)
        if let Some(pos) = window
            .split_sentence_bound_indices()
            .map(|(i, _)| i)
            .filter(|&i| i > 0)
            .last()
        {
            return to_char(pos);
        }

        // Word boundary
        if let Some((pos, ch)) = window
            .char_indices()
            .filter(|(_, c)| c.is_whitespace())
            .last()
        {
            return to_char(pos + ch.len_utf8());
        }

        hard
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

/// Byte offset of every char boundary, including the end of the string
fn char_bounds(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}
