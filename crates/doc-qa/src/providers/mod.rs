//! Provider abstractions for embeddings, generation, vector storage and
//! upload storage
//!
//! The flows only see these traits, so any backend (or a test fake) can be
//! plugged in when the application state is built.

pub mod document_store;
pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod vector_store;

pub use document_store::DocumentStoreProvider;
pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
