//! Vector index for Primer.
//!
//! A [`VectorIndex`] holds the embedded chunks of exactly one source document
//! and is immutable once built. The [`ActiveIndex`] slot holds the index that
//! queries are served from; an [`IndexStore`] persists it across restarts.

mod active;
mod memory;
mod sqlite;

pub use active::ActiveIndex;
pub use memory::MemoryIndexStore;
pub use sqlite::SqliteIndexStore;

use crate::chunking::TextChunk;
use crate::error::{PrimerError, Result};
use crate::source::SourceKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the indexed text came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSource {
    pub kind: SourceKind,
    /// File name for PDFs, video ID for YouTube.
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl IndexSource {
    pub fn new(kind: SourceKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            created_at: Utc::now(),
        }
    }
}

/// A chunk stored in the index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: Uuid,
    pub content: String,
    /// Order of this chunk in the source.
    pub order: i32,
    pub page: Option<u32>,
    pub embedding: Vec<f32>,
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: IndexedChunk,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// An immutable, searchable set of embedded chunks for one source.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    source: IndexSource,
    embedding_model: String,
    dimensions: usize,
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Build an index from chunks and their embeddings (same order).
    pub fn build(
        source: IndexSource,
        embedding_model: &str,
        chunks: Vec<TextChunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(PrimerError::Index(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let indexed = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk {
                id: Uuid::new_v4(),
                content: chunk.content,
                order: chunk.order,
                page: chunk.page,
                embedding,
            })
            .collect();

        Self::from_parts(source, embedding_model.to_string(), indexed)
    }

    /// Assemble an index from already-embedded chunks.
    pub fn from_parts(
        source: IndexSource,
        embedding_model: String,
        chunks: Vec<IndexedChunk>,
    ) -> Result<Self> {
        let dimensions = match chunks.first() {
            Some(first) => first.embedding.len(),
            None => {
                return Err(PrimerError::Index(
                    "Cannot build an index from zero chunks".to_string(),
                ))
            }
        };

        if dimensions == 0 {
            return Err(PrimerError::Index("Embeddings are empty".to_string()));
        }

        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(PrimerError::Index(format!(
                "Chunk {} has {} dimensions, expected {}",
                bad.order,
                bad.embedding.len(),
                dimensions
            )));
        }

        Ok(Self {
            source,
            embedding_model,
            dimensions,
            chunks,
        })
    }

    pub fn source(&self) -> &IndexSource {
        &self.source
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return the `k` chunks most similar to the query, best first.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query_embedding.len() != self.dimensions {
            return Err(PrimerError::Index(format!(
                "Query has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut hits: Vec<SearchHit> = self
            .chunks
            .iter()
            .map(|chunk| SearchHit {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        Ok(hits)
    }
}

/// Trait for index persistence backends.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Replace whatever is stored with this index.
    async fn save(&self, index: &VectorIndex) -> Result<()>;

    /// Load the stored index, if any.
    async fn load(&self) -> Result<Option<VectorIndex>>;

    /// Remove the stored index.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
