//! Vector index and the question-answering flow

mod engine;
mod search;

pub use engine::QueryEngine;
pub use search::VectorStore;
