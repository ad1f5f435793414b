//! Configuration for the RAG pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the API key for OpenAI-compatible backends
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Main RAG configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Language model configuration
    pub llm: LlmConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: RagConfig = toml::from_str(&raw)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the default location if present, otherwise use defaults
    pub fn load_or_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Default file (if any) with environment overrides applied
    pub fn from_env() -> Result<Self> {
        Self::load_or_default()?.with_env_overrides()
    }

    /// Apply `PDF_RAG_*` environment overrides and pick up the API key
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = env_parse::<usize>("PDF_RAG_CHUNK_SIZE")? {
            self.chunking.chunk_size = v;
        }
        if let Some(v) = env_parse::<usize>("PDF_RAG_CHUNK_OVERLAP")? {
            self.chunking.chunk_overlap = v;
        }
        if let Some(v) = env_parse::<usize>("PDF_RAG_TOP_K")? {
            self.retrieval.top_k = v;
        }
        if let Some(v) = env_parse::<f32>("PDF_RAG_TEMPERATURE")? {
            self.llm.temperature = v;
        }
        if let Ok(v) = std::env::var("PDF_RAG_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("PDF_RAG_EMBED_MODEL") {
            self.embeddings.model = v;
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }
        Ok(self)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be greater than 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be greater than 0"));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::config("embeddings.batch_size must be greater than 0"));
        }
        Ok(())
    }
}

/// Default config file location (`<config dir>/pdf-rag/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pdf-rag").join("config.toml"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(None),
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Similarity metric used to rank index entries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Cosine of the angle between vectors
    #[default]
    Cosine,
    /// Raw inner product
    DotProduct,
    /// Negated euclidean distance
    Euclidean,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks returned per question
    pub top_k: usize,
    /// Similarity metric
    pub metric: SimilarityMetric,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            metric: SimilarityMetric::Cosine,
        }
    }
}

/// Backend used for answer generation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions endpoint
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub backend: LlmBackend,
    /// Base URL of the backend API
    pub base_url: String,
    /// Generation model identifier
    pub model: String,
    /// Sampling temperature (0 = deterministic)
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
    /// API key, read from `OPENAI_API_KEY` when unset
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "default-model".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 2,
            api_key: None,
        }
    }
}

/// Backend used for embeddings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible embeddings endpoint
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
    /// Offline feature hashing, no network
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend provider
    pub backend: EmbeddingBackend,
    /// Base URL of the backend API
    pub base_url: String,
    /// Embedding model identifier
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 64,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, `RUST_LOG` takes precedence
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "pdf_rag=info".to_string(),
        }
    }
}
