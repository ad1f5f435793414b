//! pdf-rag: question answering over a set of PDF documents
//!
//! Documents are extracted page by page, split into overlapping chunks,
//! embedded into an in-memory vector index, and queried by similarity. The
//! retrieved chunks are handed to a language model with instructions to
//! answer only from them.
//!
//! ```no_run
//! use pdf_rag::{RagConfig, Session};
//!
//! # async fn run() -> pdf_rag::Result<()> {
//! let mut session = Session::from_config(RagConfig::from_env()?)?;
//! let report = session.ingest_directory("docs".as_ref()).await?;
//! for warning in &report.warnings {
//!     eprintln!("{}", warning);
//! }
//! let answer = session.ask("What color is the sky?").await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod session;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{LoadWarning, UploadedFile};
pub use pipeline::QueryPipeline;
pub use providers::{EmbeddingProvider, LanguageModel};
pub use retrieval::{Retriever, VectorIndex};
pub use session::{IngestReport, Session};
pub use types::{
    Answer, Chunk, ChunkSource, Citation, Document, FileType, Page, RetrievalResult, ScoredChunk,
};
