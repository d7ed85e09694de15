//! In-process embedding generation

mod onnx_embedder;

pub use onnx_embedder::OnnxEmbedder;
