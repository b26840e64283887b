//! Configuration module for Primer.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, LlmSettings, OllamaSettings,
    PromptSettings, Provider, RagSettings, ServerSettings, Settings, StorageSettings,
    YoutubeSettings,
};
