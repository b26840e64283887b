//! Retrieval-augmented answering over the active index.

mod response;

pub use response::{RagEngine, RagResponse};

use crate::index::SearchHit;
use serde::Serialize;

/// A retrieved chunk handed to the model as context.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    pub content: String,
    pub order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchHit> for ContextChunk {
    fn from(hit: SearchHit) -> Self {
        Self {
            content: hit.chunk.content,
            order: hit.chunk.order,
            page: hit.chunk.page,
            score: hit.score,
        }
    }
}

impl ContextChunk {
    /// Where the chunk came from: its page for PDFs, its position otherwise.
    pub fn location(&self) -> String {
        match self.page {
            Some(page) => format!("page {}", page),
            None => format!("chunk {}", self.order + 1),
        }
    }
}

/// Join retrieved chunks into the `{{context}}` block, separated by blank lines.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
