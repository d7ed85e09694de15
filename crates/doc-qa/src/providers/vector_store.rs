//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use uuid::Uuid;
use crate::error::Result;
use crate::types::{ChunkMetadata, IndexRecord};

/// Search result from vector store
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchResult {
    /// Record id
    pub id: Uuid,
    /// Chunk text
    pub content: String,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `LocalVectorStore`: SQLite-backed exact search
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert a batch of records; either all of them are stored or none
    async fn insert_records(&self, records: &[IndexRecord]) -> Result<()>;

    /// Up to `top_k` records most similar to `query_embedding`, best first.
    /// An empty index yields an empty result.
    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>>;

    /// Get total number of records stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
