//! Route handlers.

use super::{error_response, AppState};
use crate::error::PrimerError;
use crate::source::{is_pdf_file_name, SourceKind};
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

const NO_DOCUMENT: &str = "No document uploaded yet. Please upload a PDF first.";

#[derive(Deserialize)]
pub struct AddYoutubeRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct AddYoutubeResponse {
    message: &'static str,
    video_id: String,
    duration_seconds: f64,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    vectorstore_loaded: bool,
    source: Option<SourceKind>,
}

pub async fn add_youtube(
    State(state): State<AppState>,
    body: Result<Json<AddYoutubeRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let url = match req.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, "No YouTube URL provided"),
    };

    match state.orchestrator.ingest_youtube(&url).await {
        Ok(result) => Json(AddYoutubeResponse {
            message: "YouTube transcript loaded successfully!",
            video_id: result.video_id,
            duration_seconds: result.duration_seconds,
        })
        .into_response(),
        Err(e) => {
            log_failure("add-youtube", &e);
            e.into_response()
        }
    }
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(mut multipart) = multipart else {
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !is_pdf_file_name(&file_name) {
            return error_response(StatusCode::BAD_REQUEST, "Only PDF files are allowed");
        }

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        };

        return match state.orchestrator.ingest_pdf(&file_name, bytes.to_vec()).await {
            Ok(result) => {
                info!(
                    "Processed {} ({} pages, {} chunks)",
                    result.file_name, result.pages, result.chunks
                );
                Json(MessageResponse {
                    message: format!("PDF uploaded and processed: {}", result.file_name),
                })
                .into_response()
            }
            Err(e) => {
                log_failure("upload", &e);
                e.into_response()
            }
        };
    }

    error_response(StatusCode::BAD_REQUEST, "No file uploaded")
}

pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    if !state.orchestrator.status().loaded {
        return Json(ChatResponse {
            answer: NO_DOCUMENT.to_string(),
        })
        .into_response();
    }

    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let question = req.query.unwrap_or_default();
    if question.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatResponse {
                answer: "No question provided.".to_string(),
            }),
        )
            .into_response();
    }

    match state.orchestrator.ask(&question).await {
        Ok(Some(response)) => Json(ChatResponse {
            answer: response.answer,
        })
        .into_response(),
        Ok(None) => Json(ChatResponse {
            answer: NO_DOCUMENT.to_string(),
        })
        .into_response(),
        Err(e) => {
            error!("Chat failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.orchestrator.status();
    Json(HealthResponse {
        status: "running",
        vectorstore_loaded: status.loaded,
        source: status.source,
    })
}

fn log_failure(route: &str, e: &PrimerError) {
    if e.is_client_error() {
        warn!("{} rejected: {}", route, e);
    } else {
        error!("{} failed: {}", route, e);
    }
}
