//! Fixed-size character chunking with overlap

use crate::config::ChunkingConfig;
use crate::error::Result;

/// Splits text into windows of `chunk_size` characters, each starting
/// `chunk_size - overlap` characters after the previous one.
///
/// Offsets count Unicode scalar values, never bytes, so a multi-byte
/// character is never split.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Window length in characters
    chunk_size: usize,
    /// Characters shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker; fails unless `0 <= overlap < chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
        }
        .validate()?;

        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create from the chunking section of the config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Window length in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk `text`. Empty input gives no chunks; the tail windows may be
    /// shorter than `chunk_size`.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character, plus the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = boundaries.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut chunks = Vec::with_capacity(char_len / step + 1);
        let mut start = 0usize;

        while start < char_len {
            let end = (start + self.chunk_size).min(char_len);
            chunks.push(text[boundaries[start]..boundaries[end]].to_string());
            start += step;
        }

        chunks
    }
}
