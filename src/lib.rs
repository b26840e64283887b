//! Primer - retrieval-augmented Q&A over a PDF or a YouTube transcript
//!
//! A small backend for a study assistant: upload a document, then ask
//! questions about it.
//!
//! # Overview
//!
//! Primer allows you to:
//! - Index an uploaded PDF, one text unit per page
//! - Index the transcript of a YouTube video
//! - Ask questions answered from the indexed text by a language model
//! - Serve all of the above over a small JSON HTTP API
//!
//! Only one document is indexed at a time; each upload replaces the last.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `source` - PDF extraction and YouTube transcript fetching
//! - `chunking` - Text splitting strategies
//! - `embedding` - Embedding generation
//! - `llm` - Answer generation
//! - `index` - Vector index, active-index slot and persistence
//! - `rag` - RAG engine for question answering
//! - `orchestrator` - Pipeline coordination
//! - `api` - HTTP routes
//!
//! # Example
//!
//! ```rust,no_run
//! use primer::config::Settings;
//! use primer::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator.ingest_youtube("https://youtu.be/dQw4w9WgXcQ").await?;
//!     println!("Indexed {} chunks", result.chunks);
//!
//!     if let Some(response) = orchestrator.ask("What is the video about?").await? {
//!         println!("{}", response.answer);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod source;

pub use error::{PrimerError, Result};
