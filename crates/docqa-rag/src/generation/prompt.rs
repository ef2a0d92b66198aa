//! Prompt templates for grounded generation

use crate::retrieval::RetrievedChunk;
use crate::types::REFUSAL_TEXT;

/// Prompt builder for document-grounded answering
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved chunks as numbered context blocks.
    ///
    /// Block `[C1]` is the most relevant chunk. The markers are the only
    /// citation vocabulary the model is allowed to use, and they map
    /// back to chunks by position during citation extraction.
    pub fn build_context(results: &[RetrievedChunk]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[C{}] source={} chunk={}\n{}\n\n",
                i + 1,
                result.chunk.source_path,
                result.chunk.position_index,
                result.chunk.text
            ));
        }

        context
    }

    /// Build the full answering prompt with strict grounding rules
    pub fn build_answer_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a document-grounded assistant. Answer using ONLY the context blocks below.

RULES - FOLLOW THESE EXACTLY:
1. Use ONLY information stated explicitly in the context blocks.
2. Support every claim with the marker of its context block, like [C1] or [C2][C3].
3. NEVER use outside knowledge and NEVER guess beyond the context.
4. If the context blocks do not contain enough evidence to answer, reply with exactly: {refusal}

CONTEXT:
{context}

QUESTION: {question}

ANSWER:"#,
            refusal = REFUSAL_TEXT,
            context = context,
            question = question
        )
    }
}
