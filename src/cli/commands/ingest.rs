//! Upload and add-youtube commands.

use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Index a local PDF.
pub async fn run_upload(path: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::IngestPdf, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'primer doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Extracting and embedding PDF...");

    match orchestrator.ingest_pdf_path(Path::new(path)).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Output::success(&format!("PDF uploaded and processed: {}", result.file_name));
            Output::kv("Pages", &result.pages.to_string());
            Output::kv("Chunks", &result.chunks.to_string());
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to process PDF: {}", e));
            Err(e.into())
        }
    }
}

/// Index a YouTube transcript.
pub async fn run_add_youtube(url: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::IngestYoutube, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'primer doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let spinner = Output::spinner("Fetching transcript...");

    match orchestrator.ingest_youtube(url).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Output::success("YouTube transcript loaded successfully!");
            if let Some(title) = &result.title {
                Output::kv("Title", title);
            }
            Output::kv("Video", &result.video_id);
            Output::kv("Duration", &format_duration(result.duration_seconds));
            Output::kv("Chunks", &result.chunks.to_string());
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}
