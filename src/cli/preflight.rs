//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available before
//! starting work that would otherwise fail midway.

use crate::config::{Provider, Settings};
use crate::error::{PrimerError, Result};
use crate::openai::is_api_key_configured;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Indexing a PDF needs the embedding backend.
    IngestPdf,
    /// Indexing a video also needs yt-dlp.
    IngestYoutube,
    /// Asking needs both the embedding and the language model backends.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::IngestPdf => {
            check_provider(settings.embedding.provider)?;
        }
        Operation::IngestYoutube => {
            check_provider(settings.embedding.provider)?;
            check_tool(&settings.youtube.ytdlp_path)?;
        }
        Operation::Ask => {
            check_provider(settings.embedding.provider)?;
            check_provider(settings.llm.provider)?;
        }
    }
    Ok(())
}

/// OpenAI needs a key; Ollama is local and checked by `primer doctor`.
fn check_provider(provider: Provider) -> Result<()> {
    match provider {
        Provider::OpenAI if !is_api_key_configured() => Err(PrimerError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PrimerError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PrimerError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(PrimerError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
