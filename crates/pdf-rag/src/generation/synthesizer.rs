//! Answer synthesis from retrieved context

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LanguageModel;
use crate::types::{Answer, Citation, RetrievalResult};

use super::prompt::PromptBuilder;

/// Invokes the language model with a fixed temperature
#[derive(Clone)]
pub struct ModelCaller {
    llm: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl ModelCaller {
    pub fn new(llm: Arc<dyn LanguageModel>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Deterministic sampling
    pub fn deterministic(llm: Arc<dyn LanguageModel>) -> Self {
        Self::new(llm, 0.0)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Send the prompt; any model error is returned as-is
    pub async fn call(&self, prompt: &str) -> Result<String> {
        self.llm.complete(prompt, self.temperature).await
    }
}

/// Builds the grounded prompt and asks the model
#[derive(Clone)]
pub struct AnswerSynthesizer {
    caller: ModelCaller,
}

impl AnswerSynthesizer {
    pub fn new(caller: ModelCaller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &ModelCaller {
        &self.caller
    }

    /// Answer `question` from `result`.
    ///
    /// An empty result still runs the model with an empty context.
    pub async fn synthesize(&self, question: &str, result: &RetrievalResult) -> Result<Answer> {
        if result.is_empty() {
            tracing::info!("No context retrieved, asking model without context");
        }

        let prompt = PromptBuilder::build_prompt(question, result);
        let text = self.caller.call(&prompt).await?;

        Ok(Answer {
            question: question.to_string(),
            text,
            citations: result.chunks.iter().map(Citation::from_scored).collect(),
            model: self.caller.model().to_string(),
        })
    }
}
