//! Document formats and the records stored in the vector index

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Formats the service accepts for upload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// PDF document
    Pdf,
}

impl FileType {
    /// Extensions accepted at the upload boundary
    pub const ACCEPTED_EXTENSIONS: [&'static str; 3] = [".txt", ".md", ".pdf"];

    /// Detect file type from an extension (with or without the leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "md" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect file type from a file name or path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Display name for logs
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Txt => "Text",
            Self::Markdown => "Markdown",
            Self::Pdf => "PDF",
        }
    }
}

/// Lower-cased extension of `filename` including the dot, or "" when absent
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Metadata attached to every indexed chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Filename the chunk was cut from
    pub source: String,
}

/// A chunk as persisted in the vector index. Never mutated once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRecord {
    /// Globally unique record id
    pub id: Uuid,
    /// Chunk embedding
    pub embedding: Vec<f32>,
    /// Chunk text
    pub content: String,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
}

impl IndexRecord {
    /// Create a record with a fresh id
    pub fn new(content: String, embedding: Vec<f32>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            embedding,
            content,
            metadata: ChunkMetadata {
                source: source.into(),
            },
        }
    }
}
