//! Ingestion flow: store upload -> parse -> chunk -> embed -> index

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::{DocumentStoreProvider, EmbeddingProvider, VectorStoreProvider};
use crate::types::document::{extension_of, FileType, IndexRecord};

use super::chunker::TextChunker;
use super::parser::FileParser;

/// Result of ingesting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Filename the document was stored and indexed under
    pub filename: String,
    /// Number of chunks written to the index
    pub chunks_count: usize,
    /// Where the raw upload was written
    pub stored_at: PathBuf,
}

/// Orchestrates ingestion of a single uploaded document
pub struct IngestPipeline {
    document_store: Arc<dyn DocumentStoreProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    chunker: TextChunker,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        document_store: Arc<dyn DocumentStoreProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            document_store,
            embedder,
            vector_store,
            chunker,
        }
    }

    /// Check the client-supplied filename and reduce it to its final path
    /// component. Nothing is stored or parsed when this fails.
    pub fn validate_upload(filename: &str) -> Result<(String, FileType)> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::InvalidRequest("Upload is missing a filename".to_string()))?;

        let file_type = FileType::from_path(name).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "Invalid file type '{}'. Only {} allowed.",
                extension_of(name),
                FileType::ACCEPTED_EXTENSIONS.join(", ")
            ))
        })?;

        Ok((name.to_string(), file_type))
    }

    /// Ingest one uploaded document.
    ///
    /// Validation failures are returned as-is; everything after validation
    /// is reported as `Error::Ingestion`.
    pub async fn ingest(&self, filename: &str, data: &[u8]) -> Result<IngestOutcome> {
        let (filename, file_type) = Self::validate_upload(filename)?;

        self.process(&filename, file_type, data)
            .await
            .map_err(Error::ingestion)
    }

    async fn process(&self, filename: &str, file_type: FileType, data: &[u8]) -> Result<IngestOutcome> {
        let start = Instant::now();

        let stored_at = self.document_store.store_document(filename, data).await?;
        tracing::debug!("Stored upload '{}' at {}", filename, stored_at.display());

        let parsed = {
            let name = filename.to_string();
            let bytes = data.to_vec();
            tokio::task::spawn_blocking(move || FileParser::parse(&name, &bytes))
                .await
                .map_err(|e| Error::internal(format!("Task join error: {}", e)))??
        };

        let chunks = self.chunker.chunk(&parsed.content);
        if chunks.is_empty() {
            tracing::info!("'{}' has no text, nothing indexed", filename);
            return Ok(IngestOutcome {
                filename: filename.to_string(),
                chunks_count: 0,
                stored_at,
            });
        }

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let records: Vec<IndexRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(content, embedding)| IndexRecord::new(content, embedding, filename))
            .collect();

        self.vector_store.insert_records(&records).await?;

        tracing::info!(
            "Processed '{}' ({}): {} chunks in {:.1}s",
            filename,
            file_type.display_name(),
            records.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(IngestOutcome {
            filename: filename.to_string(),
            chunks_count: records.len(),
            stored_at,
        })
    }
}
