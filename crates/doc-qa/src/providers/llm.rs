//! LLM provider trait for answer generation

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt-in, text-out generation
///
/// Implementations:
/// - `GeminiClient`: Google Gemini API
/// - `OllamaLlm`: local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for `prompt`.
    ///
    /// Transport errors, provider refusals and blank output all fail with
    /// `Error::GenerationFailed`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
