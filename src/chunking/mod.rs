//! Content chunking strategies for breaking documents into searchable segments.
//!
//! Lengths are measured in characters, not bytes.

mod fixed;
mod recursive;

pub use fixed::FixedWindowSplitter;
pub use recursive::RecursiveCharacterSplitter;

use crate::error::{PrimerError, Result};
use serde::{Deserialize, Serialize};

/// A chunk of text from a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in the document.
    pub order: i32,
    /// Page the chunk came from, for paged sources.
    pub page: Option<u32>,
}

/// A unit of source text handed to a splitter, e.g. one PDF page.
#[derive(Debug, Clone)]
pub struct TextUnit {
    pub page: Option<u32>,
    pub text: String,
}

impl TextUnit {
    pub fn new(page: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
        }
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Split on paragraphs, then lines, then words, then characters.
    #[default]
    Recursive,
    /// Fixed-size character windows.
    Fixed,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(ChunkingStrategy::Recursive),
            "fixed" => Ok(ChunkingStrategy::Fixed),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(PrimerError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

/// Trait for text splitting implementations.
pub trait TextSplitter: Send + Sync {
    /// Split a single text into chunk strings.
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Split a sequence of units into ordered chunks, keeping each unit's page.
    fn split_units(&self, units: &[TextUnit]) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        let mut order = 0;
        for unit in units {
            for content in self.split_text(&unit.text) {
                chunks.push(TextChunk {
                    content,
                    order,
                    page: unit.page,
                });
                order += 1;
            }
        }
        chunks
    }
}

/// Create a splitter based on the strategy.
pub fn create_splitter(strategy: ChunkingStrategy, config: ChunkingConfig) -> Box<dyn TextSplitter> {
    match strategy {
        ChunkingStrategy::Recursive => Box::new(RecursiveCharacterSplitter::new(config)),
        ChunkingStrategy::Fixed => Box::new(FixedWindowSplitter::new(config)),
    }
}
