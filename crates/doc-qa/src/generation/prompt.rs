//! Prompt templates for answer generation

/// Separator placed between retrieved chunks in the context block
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Prompt builder for grounded answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts, in ranked order, into one context block
    pub fn build_context<S: AsRef<str>>(chunks: &[S]) -> String {
        chunks
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Build the full prompt sent to the generation provider
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            "You are a helpful assistant. Use the provided context to answer the user's question.\n\n\
             Context:\n{}\n\n\
             Question: {}",
            context, question
        )
    }
}
