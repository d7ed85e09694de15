//! Response bodies of the HTTP surface

use serde::{Deserialize, Serialize};

/// Answer returned when retrieval finds nothing to ground on
pub const INSUFFICIENT_INFORMATION_ANSWER: &str =
    "I don't have enough information in the documents to answer that.";

/// Body of a successful `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    /// Human readable status
    pub message: String,
    /// Number of chunks indexed for the document
    pub chunks_count: usize,
}

impl UploadResponse {
    /// Build the success body for `filename`
    pub fn processed(filename: &str, chunks_count: usize) -> Self {
        Self {
            message: format!("Successfully processed {}", filename),
            chunks_count,
        }
    }
}

/// Body of a successful `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryResponse {
    /// Generated answer
    pub answer: String,
    /// Retrieved chunk texts, most similar first
    pub sources: Vec<String>,
}

impl QueryResponse {
    /// The fixed answer used when no context was retrieved
    pub fn insufficient_information() -> Self {
        Self {
            answer: INSUFFICIENT_INFORMATION_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Body of `GET /report`. Static numbers, not computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReportResponse {
    pub context_precision: f64,
    pub faithfulness: f64,
}

impl Default for ReportResponse {
    fn default() -> Self {
        Self {
            context_precision: 0.9,
            faithfulness: 0.85,
        }
    }
}
