//! Prompt assembly and the Ollama HTTP client

pub mod ollama;
pub mod prompt;

pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
