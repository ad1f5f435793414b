//! Core types for the RAG pipeline

pub mod document;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, FileType, Page};
pub use response::{Answer, Citation, RetrievalResult, ScoredChunk};
