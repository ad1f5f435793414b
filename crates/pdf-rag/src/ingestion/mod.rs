//! Document ingestion: loading, extraction and chunking

mod chunker;
mod loader;
mod parser;
mod processor;

pub use chunker::{Span, TextChunker};
pub use loader::{DocumentLoader, LoadOutcome, LoadWarning, LoaderOptions, UploadedFile};
pub use parser::{
    cleanup_pdf_text, hash_content, ExtractorRegistry, PdfExtractor, PlainTextExtractor,
    TextExtractor,
};
pub use processor::{IngestPipeline, IngestedBatch};
