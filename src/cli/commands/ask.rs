//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'primer doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    if !orchestrator.load_persisted().await {
        Output::warning("No document uploaded yet. Run 'primer upload' or 'primer add-youtube' first.");
        return Ok(());
    }

    let spinner = Output::spinner("Thinking...");

    match orchestrator.ask(question).await {
        Ok(Some(response)) => {
            spinner.finish_and_clear();
            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::source_chunk(&source.location(), source.score, &source.content);
                }
            }
            Ok(())
        }
        Ok(None) => {
            spinner.finish_and_clear();
            Output::warning("No document uploaded yet.");
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
