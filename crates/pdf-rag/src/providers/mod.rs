//! Provider abstractions for embeddings and answer generation
//!
//! Backends are chosen from configuration so the rest of the pipeline only
//! sees `EmbeddingProvider` and `LanguageModel` trait objects.

pub mod embedding;
pub mod hashing;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingBackend, LlmBackend, RagConfig};
use crate::error::Result;

pub use embedding::{EmbedderIdentity, EmbeddingProvider};
pub use hashing::HashingEmbedder;
pub use llm::LanguageModel;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm, DEFAULT_OLLAMA_URL};
pub use openai::{OpenAiChat, OpenAiClient, OpenAiEmbedder};
pub use retry::{RequestFailure, RetryPolicy};

const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Ollama backends left on the OpenAI default URL talk to the local server
fn ollama_url(base_url: &str) -> &str {
    if base_url.trim_end_matches('/') == OPENAI_URL {
        DEFAULT_OLLAMA_URL
    } else {
        base_url
    }
}

/// Build the embedding provider selected by `config.embeddings.backend`
pub fn build_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let cfg = &config.embeddings;
    let embedder: Arc<dyn EmbeddingProvider> = match cfg.backend {
        EmbeddingBackend::OpenAi => {
            Arc::new(OpenAiEmbedder::new(cfg, config.llm.api_key.as_deref())?)
        }
        EmbeddingBackend::Ollama => {
            let client = OllamaClient::new(
                ollama_url(&cfg.base_url),
                Duration::from_secs(cfg.timeout_secs),
                cfg.max_retries,
            )?;
            Arc::new(OllamaEmbedder::new(
                Arc::new(client),
                cfg.model.clone(),
                cfg.dimensions,
            ))
        }
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(cfg.dimensions)?),
    };

    tracing::info!("Embedding provider: {}", embedder.identity());
    Ok(embedder)
}

/// Build the language model selected by `config.llm.backend`
pub fn build_language_model(config: &RagConfig) -> Result<Arc<dyn LanguageModel>> {
    let cfg = &config.llm;
    let llm: Arc<dyn LanguageModel> = match cfg.backend {
        LlmBackend::OpenAi => Arc::new(OpenAiChat::new(cfg)?),
        LlmBackend::Ollama => {
            let client = OllamaClient::new(
                ollama_url(&cfg.base_url),
                Duration::from_secs(cfg.timeout_secs),
                cfg.max_retries,
            )?;
            Arc::new(OllamaLlm::new(Arc::new(client), cfg.model.clone()))
        }
    };

    tracing::info!("Language model: {}/{}", llm.name(), llm.model());
    Ok(llm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_hashing_backend_needs_no_key() {
        let mut config = RagConfig::default();
        config.embeddings.backend = EmbeddingBackend::Hashing;
        config.embeddings.dimensions = 128;

        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.dimensions(), 128);
    }

    #[test]
    fn test_openai_backend_without_key_fails() {
        let config = RagConfig::default();
        assert!(matches!(build_language_model(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_ollama_falls_back_to_local_url() {
        assert_eq!(ollama_url("https://api.openai.com/v1/"), DEFAULT_OLLAMA_URL);
        assert_eq!(ollama_url("http://gpu-box:11434"), "http://gpu-box:11434");
    }
}
