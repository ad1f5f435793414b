//! Language model trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for prompt completion
///
/// Implementations:
/// - `OpenAiChat`: OpenAI-compatible chat completions
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt. Errors are fatal for the question being answered.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier
    fn model(&self) -> &str;
}
