//! Grounded answer generation: prompts, citations, composition

pub mod citation;
pub mod composer;
pub mod prompt;

pub use composer::{AnswerComposer, confidence_from_scores};
pub use prompt::PromptBuilder;
