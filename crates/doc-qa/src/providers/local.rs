//! Local provider implementations using the filesystem and SQLite
//!
//! These wrap the blocking `VectorStore` and provide filesystem upload storage.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::retrieval::VectorStore;
use crate::types::IndexRecord;

use super::document_store::DocumentStoreProvider;
use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Local vector store wrapping the SQLite index
pub struct LocalVectorStore {
    store: Arc<VectorStore>,
}

impl LocalVectorStore {
    /// Create from config
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let store = Arc::new(VectorStore::open(
            &config.vector_db.storage_path,
            config.embeddings.dimensions,
        )?);
        Ok(Self { store })
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn insert_records(&self, records: &[IndexRecord]) -> Result<()> {
        // VectorStore is sync, run it on the blocking pool
        let store = self.store.clone();
        let records = records.to_vec();
        tokio::task::spawn_blocking(move || store.insert(&records))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        let store = self.store.clone();
        let query = query_embedding.to_vec();
        tokio::task::spawn_blocking(move || store.search(&query, top_k))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn len(&self) -> Result<usize> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.len())
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}

/// Local upload store using a directory on disk
pub struct LocalDocumentStore {
    /// Directory uploads are written to
    storage_dir: PathBuf,
}

impl LocalDocumentStore {
    /// Create the store, creating its directory if needed
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    /// Directory uploads are written to
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Path a file named `filename` is stored at; only the final component
    /// of `filename` is used
    fn doc_path(&self, filename: &str) -> Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| Error::InvalidRequest(format!("Invalid filename '{}'", filename)))?;
        Ok(self.storage_dir.join(name))
    }
}

#[async_trait]
impl DocumentStoreProvider for LocalDocumentStore {
    async fn store_document(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.doc_path(filename)?;
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}
