//! Core types for the document QA service

pub mod document;
pub mod query;
pub mod response;

pub use document::{ChunkMetadata, FileType, IndexRecord};
pub use query::QueryRequest;
pub use response::{QueryResponse, ReportResponse, UploadResponse, INSUFFICIENT_INFORMATION_ANSWER};
