//! Prompt templates for grounded answer generation

use crate::types::RetrievalResult;

/// Separator between retrieved chunks in the context block
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Sentence the model is told to use when the context has no answer
pub const NOT_FOUND_ANSWER: &str = "The answer is not available in the provided documents.";

/// Prompt builder for RAG queries
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate chunk texts in retrieved order; empty for an empty result
    pub fn build_context(result: &RetrievalResult) -> String {
        result.texts().collect::<Vec<_>>().join(CONTEXT_DELIMITER)
    }

    /// Build the full prompt for one question
    pub fn build_prompt(question: &str, result: &RetrievalResult) -> String {
        let context = Self::build_context(result);
        Self::render(question, &context, &Self::format_sources(result))
    }

    fn render(question: &str, context: &str, sources: &str) -> String {
        format!(
            r#"You are a document-grounded assistant that ONLY uses information from the provided context.

GROUNDING RULES:
1. Answer using ONLY information stated in the CONTEXT below
2. If the answer is not in the context, respond with "{not_found}" Do not make up an answer.
3. NEVER use external knowledge or guess beyond what is stated
4. Answer the question in as much detail as the context allows

CONTEXT:
{context}

SOURCES:
{sources}

QUESTION: {question}

ANSWER:"#,
            not_found = NOT_FOUND_ANSWER,
            context = context,
            sources = sources,
            question = question.trim()
        )
    }

    fn format_sources(result: &RetrievalResult) -> String {
        if result.is_empty() {
            return "(none)".to_string();
        }
        result
            .chunks
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{}] {}", i + 1, c.chunk.source.format_citation()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
