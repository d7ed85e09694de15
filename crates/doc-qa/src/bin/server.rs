//! Document QA server binary
//!
//! Run with: cargo run -p doc-qa --bin doc-qa-server -- --config doc-qa.toml

use clap::Parser;
use doc_qa::{
    config::{EmbeddingBackend, LlmBackend, RagConfig},
    server::RagServer,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "doc-qa-server", version, about = "Document question answering server")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long, env = "DOC_QA_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_qa=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = RagConfig::load(args.config.as_deref())?;

    tracing::info!("Configuration loaded");
    match config.embeddings.backend {
        EmbeddingBackend::Onnx => tracing::info!("  - Embeddings: ONNX {}", config.embeddings.model),
        EmbeddingBackend::Ollama => tracing::info!(
            "  - Embeddings: Ollama {} at {}",
            config.ollama.embed_model,
            config.ollama.base_url
        ),
    }
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    match config.llm.backend {
        LlmBackend::Gemini => tracing::info!("  - LLM: Gemini {}", config.llm.generate_model),
        LlmBackend::Ollama => tracing::info!(
            "  - LLM: Ollama {} at {}",
            config.ollama.generate_model,
            config.ollama.base_url
        ),
    }
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top k: {}", config.retrieval.top_k);
    tracing::info!("  - Vector index: {}", config.vector_db.storage_path.display());
    tracing::info!("  - Upload dir: {}", config.storage.upload_dir.display());

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload  - Upload a .txt, .md or .pdf document");
    println!("  POST /query   - Ask a question");
    println!("  GET  /report  - Evaluation scores");
    println!("  GET  /health  - Health check");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
