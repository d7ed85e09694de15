//! Query flow: embed question -> search index -> prompt -> generate

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::types::QueryResponse;

/// Answers questions from the indexed chunks
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    llm: Arc<dyn LlmProvider>,
    /// Chunks retrieved per question
    top_k: usize,
}

impl QueryEngine {
    /// Create a new query engine
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            llm,
            top_k,
        }
    }

    /// Chunks retrieved per question
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer `question`. Any failure is reported as `Error::Query`.
    ///
    /// With nothing retrieved the fixed insufficient-information answer is
    /// returned and no generation call is made.
    pub async fn answer(&self, question: &str) -> Result<QueryResponse> {
        self.run(question).await.map_err(Error::query)
    }

    async fn run(&self, question: &str) -> Result<QueryResponse> {
        let start = Instant::now();

        let query_embedding = self.embedder.embed(question).await?;
        let results = self.vector_store.search(&query_embedding, self.top_k).await?;

        let sources: Vec<String> = results.into_iter().map(|r| r.content).collect();
        if sources.is_empty() {
            tracing::info!("No indexed chunks for question, returning fallback answer");
            return Ok(QueryResponse::insufficient_information());
        }

        let context = PromptBuilder::build_context(&sources);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);

        let answer = self.llm.generate(&prompt).await?;
        if answer.trim().is_empty() {
            return Err(Error::generation(format!(
                "{} returned an empty answer",
                self.llm.name()
            )));
        }

        tracing::info!(
            "Answered with {} ({}) from {} chunks in {:.1}s",
            self.llm.name(),
            self.llm.model(),
            sources.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(QueryResponse { answer, sources })
    }
}
