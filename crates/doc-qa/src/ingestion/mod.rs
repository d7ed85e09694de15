//! Document ingestion: parsing, chunking and the upload pipeline

mod chunker;
mod parser;
mod pipeline;

pub use chunker::TextChunker;
pub use parser::{FileParser, ParsedDocument};
pub use pipeline::{IngestOutcome, IngestPipeline};
