//! In-memory providers for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, LlmProvider, VectorSearchResult, VectorStoreProvider};
use crate::types::IndexRecord;

/// Deterministic embedder: each distinct text maps to a fixed pseudo-random
/// unit vector, so identical texts have similarity 1.0
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        // FNV-1a seed, then xorshift
        let mut state = text
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
            | 1;

        let mut v: Vec<f32> = (0..self.dimensions)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 2001) as f32 / 1000.0 - 1.0
            })
            .collect();

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Embedder whose every call fails
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding("embedding backend unavailable"))
    }

    fn dimensions(&self) -> usize {
        16
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Vector store held in a `Vec`, searched exhaustively
#[derive(Default)]
pub struct MemoryVectorStore {
    records: Mutex<Vec<IndexRecord>>,
}

impl MemoryVectorStore {
    /// Snapshot of stored records in insertion order
    pub fn records(&self) -> Vec<IndexRecord> {
        self.records.lock().clone()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[async_trait]
impl VectorStoreProvider for MemoryVectorStore {
    async fn insert_records(&self, records: &[IndexRecord]) -> Result<()> {
        self.records.lock().extend_from_slice(records);
        Ok(())
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        let mut results: Vec<VectorSearchResult> = self
            .records
            .lock()
            .iter()
            .map(|r| VectorSearchResult {
                id: r.id,
                content: r.content.clone(),
                metadata: r.metadata.clone(),
                similarity: cosine(query_embedding, &r.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.lock().len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// LLM returning a fixed reply (or failing) and recording its prompts
pub struct ScriptedLlm {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of generate calls made
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| Error::generation("scripted failure"))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
