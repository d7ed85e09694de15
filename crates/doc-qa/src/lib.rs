//! doc-qa: document question answering over a local vector index
//!
//! Uploaded `.txt`, `.md` and `.pdf` files are split into overlapping
//! chunks, embedded and stored in a SQLite-backed vector index. Questions
//! are answered by an LLM prompted with the most similar chunks.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{ChunkMetadata, FileType, IndexRecord},
    query::QueryRequest,
    response::{QueryResponse, ReportResponse, UploadResponse},
};
