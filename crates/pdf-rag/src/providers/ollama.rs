//! Ollama client and providers for embeddings and generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LanguageModel;
use super::retry::{RequestFailure, RetryPolicy};

/// Default address of a local Ollama server
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama API client with automatic retry
pub struct OllamaClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(max_retries),
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let client = self.client.clone();

        self.retry
            .run(|| {
                let url = url.clone();
                let client = client.clone();
                let request = EmbedRequest {
                    model: model.to_string(),
                    prompt: text.to_string(),
                };

                async move {
                    let response = client
                        .post(&url)
                        .json(&request)
                        .send()
                        .await
                        .map_err(|e| RequestFailure::transport("Embedding request failed", &e))?;

                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(RequestFailure::status("Embedding failed", status, &body));
                    }

                    let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                        RequestFailure::fatal(format!("Failed to parse embedding response: {}", e))
                    })?;

                    Ok(embed_response.embedding)
                }
            })
            .await
            .map_err(|e| Error::embedding(e.message))
    }

    /// Run a non-streaming generation with retry
    pub async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let client = self.client.clone();

        tracing::info!("Generating answer with model: {}", model);

        self.retry
            .run(|| {
                let url = url.clone();
                let client = client.clone();
                let request = GenerateRequest {
                    model: model.to_string(),
                    prompt: prompt.to_string(),
                    stream: false,
                    options: GenerateOptions { temperature },
                };

                async move {
                    let response = client
                        .post(&url)
                        .json(&request)
                        .send()
                        .await
                        .map_err(|e| RequestFailure::transport("Generation request failed", &e))?;

                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(RequestFailure::status("Generation failed", status, &body));
                    }

                    let generate_response: GenerateResponse =
                        response.json().await.map_err(|e| {
                            RequestFailure::fatal(format!(
                                "Failed to parse generation response: {}",
                                e
                            ))
                        })?;

                    Ok(generate_response.response)
                }
            })
            .await
            .map_err(|e| Error::model(e.message))
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            dimensions,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.client.embed(&self.model, text).await?;
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaLlm {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.client.generate(&self.model, prompt, temperature).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
