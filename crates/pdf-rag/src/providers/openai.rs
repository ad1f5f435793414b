//! OpenAI-compatible providers for embeddings and chat completion

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig, API_KEY_ENV};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LanguageModel;
use super::retry::{RequestFailure, RetryPolicy};

/// HTTP client for an OpenAI-compatible API
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client; the API key is required
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::config(format!("missing API key, set {}", API_KEY_ENV)))?;

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| Error::config("invalid API key"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(max_retries),
        })
    }

    /// Check the API answers with our credentials
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed a batch of inputs, returned in input order
    pub async fn embeddings(
        &self,
        model: &str,
        dimensions: Option<usize>,
        inputs: &[String],
    ) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.base_url);

        let mut parsed: EmbeddingResponse = self
            .retry
            .run(|| async {
                let request = EmbeddingRequest {
                    model,
                    input: inputs,
                    dimensions,
                };
                let response = self
                    .client
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

                response.json::<EmbeddingResponse>().await.map_err(|e| {
                    RequestFailure::fatal(format!("Failed to parse embedding response: {}", e))
                })
            })
            .await
            .map_err(|e| Error::embedding(e.message))?;

        if parsed.data.len() != inputs.len() {
            return Err(Error::embedding(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }
        parsed.data.sort_by_key(|entry| entry.index);
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }

    /// Single-turn chat completion
    pub async fn chat(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let parsed: ChatResponse = self
            .retry
            .run(|| async {
                let request = ChatRequest {
                    model,
                    temperature,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                };
                let response = self
                    .client
                    .post(&url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| RequestFailure::transport("Chat request failed", &e))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(RequestFailure::status("Chat completion failed", status, &body));
                }

                response.json::<ChatResponse>().await.map_err(|e| {
                    RequestFailure::fatal(format!("Failed to parse chat response: {}", e))
                })
            })
            .await
            .map_err(|e| Error::model(e.message))?;

        extract_answer(parsed)
    }
}

fn extract_answer(parsed: ChatResponse) -> Result<String> {
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::model("malformed chat response: no message content"))
}

/// Embeddings through an OpenAI-compatible endpoint
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: Option<&str>) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )?;
        Ok(Self::from_client(Arc::new(client), config))
    }

    pub fn from_client(client: Arc<OpenAiClient>, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
        }
    }

    /// Only the text-embedding-3 family accepts a requested size
    fn requested_dimensions(&self) -> Option<usize> {
        self.model
            .starts_with("text-embedding-3")
            .then_some(self.dimensions)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .client
            .embeddings(&self.model, self.requested_dimensions(), &[text.to_string()])
            .await?;
        vectors
            .pop()
            .ok_or_else(|| Error::embedding("provider returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self
                .client
                .embeddings(&self.model, self.requested_dimensions(), batch)
                .await?;
            embeddings.extend(vectors);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Chat completion through an OpenAI-compatible endpoint
pub struct OpenAiChat {
    client: Arc<OpenAiClient>,
    model: String,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.base_url,
            config.api_key.as_deref(),
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )?;
        Ok(Self {
            client: Arc::new(client),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        tracing::info!("Generating answer with model: {}", self.model);
        self.client.chat(&self.model, prompt, temperature).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
