//! Query pipeline: Retriever -> PromptBuilder -> ModelCaller

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{AnswerSynthesizer, ModelCaller};
use crate::providers::{EmbeddingProvider, LanguageModel};
use crate::retrieval::{Retriever, VectorIndex};
use crate::types::{Answer, RetrievalResult};

/// Answers one question at a time against an index
#[derive(Clone)]
pub struct QueryPipeline {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl QueryPipeline {
    pub fn new(retriever: Retriever, synthesizer: AnswerSynthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    /// Wire the stages from configuration and the two providers
    pub fn from_config(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self::new(
            Retriever::new(embedder, config.retrieval.top_k),
            AnswerSynthesizer::new(ModelCaller::new(llm, config.llm.temperature)),
        )
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn synthesizer(&self) -> &AnswerSynthesizer {
        &self.synthesizer
    }

    pub async fn retrieve(&self, index: &VectorIndex, question: &str) -> Result<RetrievalResult> {
        self.retriever.retrieve(index, question).await
    }

    /// Embed the question, search, prompt, call the model
    pub async fn answer(&self, index: &VectorIndex, question: &str) -> Result<Answer> {
        let result = self.retriever.retrieve(index, question).await?;
        self.synthesizer.synthesize(question, &result).await
    }
}
