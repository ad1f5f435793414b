//! Prompt construction and answer generation

pub mod prompt;
pub mod synthesizer;

pub use prompt::{PromptBuilder, CONTEXT_DELIMITER, NOT_FOUND_ANSWER};
pub use synthesizer::{AnswerSynthesizer, ModelCaller};
