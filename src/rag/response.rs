//! Answer generation.

use super::{format_context_for_prompt, ContextChunk};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::index::VectorIndex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// RAG engine for question answering.
pub struct RagEngine {
    model: Arc<dyn LanguageModel>,
    embedder: Arc<dyn Embedder>,
    prompts: Prompts,
    top_k: usize,
}

impl RagEngine {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
        prompts: Prompts,
        top_k: usize,
    ) -> Self {
        Self {
            model,
            embedder,
            prompts,
            top_k,
        }
    }

    /// Answer a question from the given index.
    #[instrument(skip(self, index), fields(source = %index.source().label))]
    pub async fn answer(&self, index: &VectorIndex, question: &str) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let query_embedding = self.embedder.embed(question).await?;
        let sources: Vec<ContextChunk> = index
            .search(&query_embedding, self.top_k)?
            .into_iter()
            .map(ContextChunk::from)
            .collect();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&sources));

        let prompt = self.prompts.render_with_custom(&self.prompts.rag.template, &vars);
        let answer = self.model.complete(&prompt).await?;

        debug!("Generated response with {} sources", sources.len());

        Ok(RagResponse { answer, sources })
    }
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub answer: String,
    /// Chunks the answer was grounded on, best first.
    pub sources: Vec<ContextChunk>,
}
