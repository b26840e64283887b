//! Embedding generation for semantic search and retrieval.

mod ollama;
mod openai;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{Provider, Settings};
use crate::error::Result;
use crate::ollama::OllamaClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Name of the embedding model.
    fn model(&self) -> &str;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Build the embedder selected by the settings.
pub fn create_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let dimensions = settings.embedding.dimensions as usize;
    let embedder: Arc<dyn Embedder> = match settings.embedding.provider {
        Provider::Ollama => Arc::new(OllamaEmbedder::new(
            OllamaClient::new(&settings.ollama, settings.general.request_timeout())?,
            &settings.embedding.model,
            dimensions,
        )),
        Provider::OpenAI => Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            dimensions,
            settings.general.request_timeout(),
        )?),
    };
    Ok(embedder)
}
