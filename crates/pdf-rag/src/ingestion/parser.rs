//! Per-format text extraction

use sha2::{Digest, Sha256};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{FileType, Page};

/// Upper bound for the pdf-extract fallback, which can hang on odd fonts
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns raw file bytes into page text
pub trait TextExtractor: Send + Sync {
    /// Extract pages in natural order
    fn extract(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>>;

    /// File type this extractor handles
    fn file_type(&self) -> FileType;
}

/// PDF extraction: per-page via lopdf, whole-document pdf-extract fallback
#[derive(Debug, Default, Clone)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Per-page text through lopdf
    fn extract_pages(filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to load PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(Error::extraction(filename, "PDF is encrypted"));
        }

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            let text = match doc.extract_text(&[*page_number]) {
                Ok(text) => cleanup_pdf_text(&text),
                Err(e) => {
                    tracing::debug!("{}: no text on page {}: {}", filename, page_number, e);
                    String::new()
                }
            };
            pages.push(Page::new(*page_number, text));
        }
        Ok(pages)
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        let pages = contain_panic(filename, || Self::extract_pages(filename, data))?;

        if pages.iter().all(Page::is_blank) {
            tracing::debug!("{}: lopdf produced no text, trying pdf-extract", filename);
            let text = cleanup_pdf_text(&extract_with_timeout(filename, data)?);
            if text.trim().is_empty() {
                return Err(Error::extraction(
                    filename,
                    "PDF has no extractable text (image-based PDFs need OCR)",
                ));
            }
            return Ok(vec![Page::new(1, text)]);
        }

        Ok(pages)
    }

    fn file_type(&self) -> FileType {
        FileType::Pdf
    }
}

/// Turn a panic inside a parser into an extraction error for that file
fn contain_panic<T>(filename: &str, parse: impl FnOnce() -> Result<T>) -> Result<T> {
    std::panic::catch_unwind(AssertUnwindSafe(parse)).unwrap_or_else(|_| {
        tracing::error!("{}: PDF parser panicked", filename);
        Err(Error::extraction(filename, "parser crashed"))
    })
}

/// Run pdf-extract on a worker thread so a stuck font decoder cannot block the batch
fn extract_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
    use std::sync::mpsc;
    use std::thread;

    let data_vec = data.to_vec();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = pdf_extract::extract_text_from_mem(&data_vec);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(Error::extraction(filename, e.to_string())),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!("{}: pdf-extract timed out after {:?}", filename, PDF_EXTRACT_TIMEOUT);
            Err(Error::extraction(filename, "text extraction timed out"))
        }
        // pdf-extract panicked and dropped the sender
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(Error::extraction(filename, "text extraction crashed"))
        }
    }
}

/// Plain text and markdown, treated as a single page
#[derive(Debug, Clone)]
pub struct PlainTextExtractor {
    file_type: FileType,
}

impl PlainTextExtractor {
    pub fn new(file_type: FileType) -> Self {
        Self { file_type }
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<Vec<Page>> {
        let content = std::str::from_utf8(data)
            .map_err(|e| Error::extraction(filename, format!("not valid UTF-8: {}", e)))?;
        Ok(vec![Page::new(1, content.replace("\r\n", "\n"))])
    }

    fn file_type(&self) -> FileType {
        self.file_type
    }
}

/// Selects an extractor by extension, falling back to content sniffing
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Register an extractor; later registrations win for the same type
    pub fn register(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.retain(|e| e.file_type() != extractor.file_type());
        self.extractors.push(extractor);
        self
    }

    /// Extractor for a known file type
    pub fn for_type(&self, file_type: FileType) -> Option<&Arc<dyn TextExtractor>> {
        self.extractors.iter().find(|e| e.file_type() == file_type)
    }

    /// Resolve the file type for a file, by extension first then by content
    pub fn detect(&self, filename: &str, data: &[u8]) -> FileType {
        match FileType::from_filename(filename) {
            FileType::Unknown => FileType::sniff(data),
            known => known,
        }
    }

    /// Extract pages from a file
    pub fn extract(&self, filename: &str, data: &[u8]) -> Result<(FileType, Vec<Page>)> {
        let file_type = self.detect(filename, data);
        let extractor = self.for_type(file_type).ok_or_else(|| {
            Error::UnsupportedFileType(format!("{} ({})", filename, file_type.display_name()))
        })?;
        let pages = extractor.extract(filename, data)?;
        Ok((file_type, pages))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
            .register(Arc::new(PdfExtractor))
            .register(Arc::new(PlainTextExtractor::new(FileType::Txt)))
            .register(Arc::new(PlainTextExtractor::new(FileType::Markdown)))
    }
}

/// Normalize typographic glyphs and whitespace left behind by PDF text extraction
pub fn cleanup_pdf_text(text: &str) -> String {
    let normalized = text
        .replace('\0', "")
        .replace('\u{2010}', "-") // Hyphen
        .replace('\u{2011}', "-") // Non-breaking hyphen
        .replace('\u{2013}', "-") // En dash
        .replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace("\r\n", "\n");

    // Keep single blank lines as paragraph breaks, drop longer runs
    let mut out = String::with_capacity(normalized.len());
    let mut blank_run = 0usize;
    for line in normalized.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }
    out
}

/// Hash content for document identity
pub fn hash_content(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
