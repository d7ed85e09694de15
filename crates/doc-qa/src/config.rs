//! Configuration for the document QA service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment override for the upload directory
pub const UPLOAD_DIR_ENV: &str = "DOC_QA_UPLOAD_DIR";
/// Environment override for the vector database file
pub const VECTOR_DB_ENV: &str = "DOC_QA_VECTOR_DB";
/// Environment override for the listen port
pub const PORT_ENV: &str = "DOC_QA_PORT";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Generation (LLM) configuration
    pub llm: LlmConfig,
    /// Ollama endpoint, used when either backend is `ollama`
    pub ollama: OllamaConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Upload storage configuration
    pub storage: StorageConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, apply environment
    /// overrides and validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file (missing sections use defaults)
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse TOML configuration text
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides through `lookup`; a port that does not
    /// parse is a configuration error
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(GEMINI_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(dir) = lookup(UPLOAD_DIR_ENV) {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup(VECTOR_DB_ENV) {
            self.vector_db.storage_path = PathBuf::from(path);
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port.trim().parse().map_err(|e| {
                Error::Config(format!("{} must be a port number, got '{}': {}", PORT_ENV, port, e))
            })?;
        }
        Ok(())
    }

    /// Reject configurations the flows cannot run with
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".to_string()));
        }
        if self.llm.backend == LlmBackend::Gemini
            && self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(Error::Config(format!(
                "Gemini backend selected but {} is not set",
                GEMINI_API_KEY_ENV
            )));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Which embedding implementation to run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// In-process ONNX sentence-transformer
    #[default]
    Onnx,
    /// Ollama embeddings endpoint
    Ollama,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding backend
    pub backend: EmbeddingBackend,
    /// Sentence-transformers model name (ONNX backend)
    pub model: String,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// Batch size for embedding generation
    pub batch_size: usize,
    /// Maximum sequence length
    pub max_length: usize,
    /// Cache directory for models
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Onnx,
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            batch_size: 32,
            max_length: 256,
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("doc-qa")
                .join("models"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// `chunk_overlap < chunk_size` is required for the chunker to advance
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the generator
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Which generation implementation to run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini API
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generation backend
    pub backend: LlmBackend,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Generation model name
    pub generate_model: String,
    /// Sampling temperature (provider default when unset)
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Gemini API key, normally taken from `GEMINI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Gemini,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            generate_model: "gemini-2.5-flash".to_string(),
            temperature: None,
            timeout_secs: 120,
            api_key: None,
        }
    }
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "all-minilm".to_string(),
            generate_model: "llama3.2".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// SQLite file backing the vector index
    pub storage_path: PathBuf,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./data/vector_db/index.sqlite3"),
        }
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory raw uploads are written to
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./data/uploads"),
        }
    }
}
