//! Status command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Show the persisted index.
pub async fn run_status(settings: Settings) -> Result<()> {
    let index_path = settings.index_path();
    let orchestrator = Orchestrator::new(settings)?;
    orchestrator.load_persisted().await;
    let status = orchestrator.status();

    Output::header("Primer Status");
    Output::kv("Index", &index_path.display().to_string());

    match (status.source, status.label) {
        (Some(source), Some(label)) if status.loaded => {
            Output::kv("Source", &source.to_string());
            Output::kv("Document", &label);
            Output::kv("Chunks", &status.chunk_count.to_string());
        }
        _ => Output::info("No document indexed."),
    }

    Ok(())
}
