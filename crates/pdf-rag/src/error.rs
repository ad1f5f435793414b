//! Error types for the RAG pipeline

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single file could not be turned into text
    #[error("Failed to extract text from '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// No extractor is registered for the file
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding provider failure (build or query time)
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector with the wrong number of components
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Query embedder differs from the one the index was built with
    #[error("Embedder mismatch: index built with '{indexed}', query uses '{query}'")]
    EmbedderMismatch { indexed: String, query: String },

    /// Language model call failed
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a model invocation error
    pub fn model(message: impl Into<String>) -> Self {
        Self::ModelInvocation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_message_names_file() {
        let err = Error::extraction("report.pdf", "invalid file header");
        assert_eq!(
            err.to_string(),
            "Failed to extract text from 'report.pdf': invalid file header"
        );
    }
}
