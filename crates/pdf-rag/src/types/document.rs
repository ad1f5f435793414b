//! Document, page and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename's extension
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Sniff the file type from leading bytes
    pub fn sniff(data: &[u8]) -> Self {
        let head = &data[..data.len().min(1024)];
        if head.windows(5).any(|w| w == b"%PDF-") {
            Self::Pdf
        } else {
            Self::Unknown
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Unknown => "Unknown",
        }
    }
}

/// Text extracted from a single page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Extracted text of the page
    pub content: String,
}

impl Page {
    pub fn new(page_number: u32, content: impl Into<String>) -> Self {
        Self {
            page_number,
            content: content.into(),
        }
    }

    /// Pages with no visible text produce no chunks
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A loaded source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Filename as uploaded or discovered
    pub filename: String,
    /// Path on disk, when loaded from a directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the raw bytes
    pub content_hash: String,
    /// Pages in natural order
    pub pages: Vec<Page>,
    /// File size in bytes
    pub file_size: u64,
    /// Load timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    pub fn new(
        filename: String,
        file_type: FileType,
        content_hash: String,
        pages: Vec<Page>,
        file_size: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            path: None,
            file_type,
            content_hash,
            pages,
            file_size,
            ingested_at: chrono::Utc::now(),
        }
    }

    /// Attach the on-disk location
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }
}

/// Source information for a chunk (used for citations)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Filename of the originating document
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Total pages in the document
    pub page_count: u32,
}

impl ChunkSource {
    /// Create source info for a page of a document
    pub fn for_page(doc: &Document, page: &Page) -> Self {
        Self {
            filename: doc.filename.clone(),
            file_type: doc.file_type,
            page_number: page.page_number,
            page_count: doc.page_count(),
        }
    }

    /// Format source for display
    pub fn format_citation(&self) -> String {
        if self.page_count > 1 {
            format!("{}, Page {} of {}", self.filename, self.page_number, self.page_count)
        } else {
            format!("{}, Page {}", self.filename, self.page_number)
        }
    }
}

/// A chunk of text from one page of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content, a contiguous slice of the page text
    pub content: String,
    /// Source information for citations
    pub source: ChunkSource,
    /// Character position within the page
    pub char_start: usize,
    pub char_end: usize,
    /// Characters shared with the previous chunk of the same page
    pub overlap: usize,
    /// Chunk index within the document
    pub chunk_index: u32,
}

impl Chunk {
    pub fn new(
        document_id: Uuid,
        content: String,
        source: ChunkSource,
        char_start: usize,
        char_end: usize,
        overlap: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            source,
            char_start,
            char_end,
            overlap,
            chunk_index,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }

    /// The part of the chunk not shared with its predecessor
    pub fn fresh_text(&self) -> &str {
        match self.content.char_indices().nth(self.overlap) {
            Some((byte, _)) => &self.content[byte..],
            None => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_filename("Report.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.md"), FileType::Markdown);
        assert_eq!(FileType::from_filename("README"), FileType::Unknown);
        assert_eq!(FileType::sniff(b"%PDF-1.7\n%..."), FileType::Pdf);
        assert_eq!(FileType::sniff(b"plain words"), FileType::Unknown);
    }

    #[test]
    fn test_fresh_text_skips_overlap_by_chars() {
        let doc = Document::new("a.pdf".into(), FileType::Pdf, String::new(), vec![], 0);
        let page = Page::new(1, "héllo wörld");
        let chunk = Chunk::new(
            doc.id,
            "héllo wörld".to_string(),
            ChunkSource::for_page(&doc, &page),
            4,
            15,
            3,
            1,
        );
        assert_eq!(chunk.fresh_text(), "lo wörld");
        assert_eq!(chunk.char_len(), 11);
    }

    #[test]
    fn test_format_citation() {
        let source = ChunkSource {
            filename: "guide.pdf".into(),
            file_type: FileType::Pdf,
            page_number: 2,
            page_count: 5,
        };
        assert_eq!(source.format_citation(), "guide.pdf, Page 2 of 5");
    }
}
