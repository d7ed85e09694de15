//! Application state for the QA server

use std::sync::Arc;

use crate::config::{EmbeddingBackend, LlmBackend, RagConfig};
use crate::embeddings::OnnxEmbedder;
use crate::error::{Error, Result};
use crate::generation::OllamaClient;
use crate::ingestion::{IngestPipeline, TextChunker};
use crate::providers::{
    gemini::GeminiClient,
    local::{LocalDocumentStore, LocalVectorStore},
    ollama::{OllamaEmbedder, OllamaLlm},
    DocumentStoreProvider, EmbeddingProvider, LlmProvider, VectorStoreProvider,
};
use crate::retrieval::QueryEngine;

/// Provider handles the service is assembled from
pub struct Providers {
    pub document_store: Arc<dyn DocumentStoreProvider>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub vector_store: Arc<dyn VectorStoreProvider>,
    pub llm: Arc<dyn LlmProvider>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Upload flow
    ingest: IngestPipeline,
    /// Question flow
    query: QueryEngine,
}

impl AppState {
    /// Build the configured providers and assemble the state
    pub async fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Initializing application state (embeddings: {:?}, llm: {:?})",
            config.embeddings.backend,
            config.llm.backend
        );

        let ollama = match (config.embeddings.backend, config.llm.backend) {
            (EmbeddingBackend::Ollama, _) | (_, LlmBackend::Ollama) => {
                Some(Arc::new(OllamaClient::new(&config.ollama)?))
            }
            _ => None,
        };

        let embedder: Arc<dyn EmbeddingProvider> = match (config.embeddings.backend, &ollama) {
            (EmbeddingBackend::Ollama, Some(client)) => Arc::new(OllamaEmbedder::from_client(
                client.clone(),
                config.embeddings.dimensions,
            )),
            _ => Arc::new(OnnxEmbedder::new(&config.embeddings).await?),
        };
        tracing::info!("Embedding provider ready: {}", embedder.name());

        let llm: Arc<dyn LlmProvider> = match (config.llm.backend, &ollama) {
            (LlmBackend::Ollama, Some(client)) => Arc::new(OllamaLlm::from_client(client.clone())),
            _ => Arc::new(GeminiClient::new(&config.llm)?),
        };
        tracing::info!("Generation provider ready: {} ({})", llm.name(), llm.model());

        let vector_store = Arc::new(LocalVectorStore::from_config(&config)?);
        tracing::info!(
            "Vector index at {} ({} records)",
            config.vector_db.storage_path.display(),
            vector_store.len().await?
        );

        let document_store = Arc::new(LocalDocumentStore::new(config.storage.upload_dir.clone())?);
        tracing::info!("Uploads stored in {}", document_store.storage_dir().display());

        Self::from_providers(
            config,
            Providers {
                document_store,
                embedder,
                vector_store,
                llm,
            },
        )
    }

    /// Assemble the state from already constructed providers
    pub fn from_providers(config: RagConfig, providers: Providers) -> Result<Self> {
        if providers.embedder.dimensions() != config.embeddings.dimensions {
            return Err(Error::Config(format!(
                "Embedding provider '{}' produces {} dimensions but the index is configured for {}",
                providers.embedder.name(),
                providers.embedder.dimensions(),
                config.embeddings.dimensions
            )));
        }

        let chunker = TextChunker::from_config(&config.chunking)?;

        let ingest = IngestPipeline::new(
            providers.document_store,
            providers.embedder.clone(),
            providers.vector_store.clone(),
            chunker,
        );
        let query = QueryEngine::new(
            providers.embedder,
            providers.vector_store,
            providers.llm,
            config.retrieval.top_k,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                ingest,
                query,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the upload pipeline
    pub fn ingest_pipeline(&self) -> &IngestPipeline {
        &self.inner.ingest
    }

    /// Get the query engine
    pub fn query_engine(&self) -> &QueryEngine {
        &self.inner.query
    }
}
