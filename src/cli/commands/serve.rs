//! HTTP API server.

use crate::api::{router, AppState};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server until Ctrl+C.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        settings.server.host = host;
    }
    if let Some(port) = port {
        settings.server.port = port;
    }

    let orchestrator = Arc::new(Orchestrator::new(settings.clone())?);
    let restored = orchestrator.load_persisted().await;

    let app = router(AppState::new(orchestrator.clone()), &settings.server)?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("Primer API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    if restored {
        let status = orchestrator.status();
        Output::info(&format!(
            "Restored {} ({} chunks)",
            status.label.unwrap_or_default(),
            status.chunk_count
        ));
    }
    println!();
    println!("Endpoints:");
    Output::kv("Add YouTube", "POST /add-youtube");
    Output::kv("Upload PDF", "POST /upload");
    Output::kv("Chat", "POST /chat");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
