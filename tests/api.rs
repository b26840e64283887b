use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use tempfile::TempDir;
use tokio_test::assert_ok;
use tower::ServiceExt;

use primer::api::{router, AppState};
use primer::config::{Prompts, Settings};
use primer::embedding::Embedder;
use primer::index::{IndexStore, SqliteIndexStore};
use primer::llm::LanguageModel;
use primer::orchestrator::Orchestrator;
use primer::source::{TrackKind, Transcript, TranscriptSegment, TranscriptSource};
use primer::{PrimerError, Result};

const BOUNDARY: &str = "primer-test-boundary";
const VIDEO_ID: &str = "dQw4w9WgXcQ";
const SILENT_VIDEO_ID: &str = "aaaaaaaaaaa";
const PRIVATE_VIDEO_ID: &str = "bbbbbbbbbbb";

struct MockEmbedder;

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let len = text.len() as f32;
        Ok(vec![1.0, len.sqrt(), (len % 7.0) + 1.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn model(&self) -> &str {
        "mock-embed"
    }

    fn dimensions(&self) -> usize {
        3
    }
}

/// Holds back any batch that mentions "slowly" so it finishes after others.
struct DelayedEmbedder;

#[async_trait]
impl Embedder for DelayedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        MockEmbedder.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("slowly")) {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        MockEmbedder.embed_batch(texts).await
    }

    fn model(&self) -> &str {
        MockEmbedder.model()
    }

    fn dimensions(&self) -> usize {
        MockEmbedder.dimensions()
    }
}

/// Answers with the prompt it was given, so tests can see the context.
struct EchoModel;

#[async_trait]
impl LanguageModel for EchoModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(format!("ECHO: {}", prompt))
    }

    fn model(&self) -> &str {
        "echo"
    }
}

struct MockTranscripts;

#[async_trait]
impl TranscriptSource for MockTranscripts {
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        match video_id {
            VIDEO_ID => Ok(Transcript {
                video_id: video_id.to_string(),
                title: Some("Cell biology in ten minutes".to_string()),
                language: "en".to_string(),
                kind: TrackKind::Manual,
                segments: vec![
                    TranscriptSegment::new("Today we talk about ribosomes.", 0.0, 4.0),
                    TranscriptSegment::new("They build proteins.", 4.0, 3.5),
                ],
            }),
            SILENT_VIDEO_ID => Err(PrimerError::NoTranscript),
            PRIVATE_VIDEO_ID => Err(PrimerError::VideoUnavailable),
            other => Err(PrimerError::VideoSource(format!("unexpected video {}", other))),
        }
    }
}

struct TestApp {
    router: Router,
    orchestrator: Arc<Orchestrator>,
    dir: TempDir,
}

fn test_settings(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.general.data_dir = dir.display().to_string();
    settings.storage.pdf_dir = dir.join("pdfs").display().to_string();
    settings.storage.index_path = dir.join("index.db").display().to_string();
    settings
}

fn build_orchestrator(dir: &Path) -> Orchestrator {
    build_orchestrator_with(dir, Arc::new(MockEmbedder))
}

fn build_orchestrator_with(dir: &Path, embedder: Arc<dyn Embedder>) -> Orchestrator {
    let settings = test_settings(dir);
    let store: Arc<dyn IndexStore> =
        Arc::new(SqliteIndexStore::new(&settings.index_path()).unwrap());

    Orchestrator::with_components(
        settings,
        Prompts::default(),
        embedder,
        Arc::new(EchoModel),
        Arc::new(MockTranscripts),
        store,
    )
}

fn create_test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let orchestrator = Arc::new(build_orchestrator(dir.path()));
    let settings = test_settings(dir.path());
    let router = router(AppState::new(orchestrator.clone()), &settings.server).unwrap();

    TestApp {
        router,
        orchestrator,
        dir,
    }
}

fn pdf_with_text(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn upload_request(file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn health_request() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn given_fresh_server_when_health_check_then_nothing_is_loaded() {
    let app = create_test_app();

    let (status, body) = send(&app.router, health_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["vectorstore_loaded"], false);
    assert_eq!(body["source"], Value::Null);
}

#[tokio::test]
async fn given_no_document_when_chat_then_returns_no_document_message() {
    let app = create_test_app();

    let (status, body) = send(&app.router, json_request("/chat", r#"{"query": "Hi?"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["answer"],
        "No document uploaded yet. Please upload a PDF first."
    );
}

#[tokio::test]
async fn given_non_pdf_when_upload_then_returns_bad_request() {
    let app = create_test_app();

    let (status, body) = send(&app.router, upload_request("notes.txt", b"plain text")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only PDF files are allowed");
    assert!(!app.orchestrator.status().loaded);
}

#[tokio::test]
async fn given_multipart_without_file_when_upload_then_returns_bad_request() {
    let app = create_test_app();

    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn given_pdf_when_upload_then_health_reports_pdf_source() {
    let app = create_test_app();
    let pdf = pdf_with_text("Mitochondria are the powerhouse of the cell.");

    let (status, body) = send(&app.router, upload_request("biology.pdf", &pdf)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "PDF uploaded and processed: biology.pdf");
    assert!(app.dir.path().join("pdfs").join("biology.pdf").exists());

    let (_, health) = send(&app.router, health_request()).await;
    assert_eq!(health["vectorstore_loaded"], true);
    assert_eq!(health["source"], "pdf");
}

#[tokio::test]
async fn given_uploaded_pdf_when_chat_then_answer_uses_document_context() {
    let app = create_test_app();
    let pdf = pdf_with_text("Mitochondria are the powerhouse of the cell.");
    send(&app.router, upload_request("biology.pdf", &pdf)).await;

    let (status, body) = send(
        &app.router,
        json_request("/chat", r#"{"query": "What powers the cell?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.contains("Mitochondria are the powerhouse of the cell."));
    assert!(answer.contains("Question: What powers the cell?"));
}

#[tokio::test]
async fn given_uploaded_pdf_when_blank_query_then_returns_bad_request() {
    let app = create_test_app();
    let pdf = pdf_with_text("Some lecture notes.");
    send(&app.router, upload_request("notes.pdf", &pdf)).await;

    let (status, body) = send(&app.router, json_request("/chat", r#"{"query": "   "}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["answer"], "No question provided.");
}

#[tokio::test]
async fn given_uploaded_pdf_when_malformed_json_then_returns_bad_request() {
    let app = create_test_app();
    let pdf = pdf_with_text("Some lecture notes.");
    send(&app.router, upload_request("notes.pdf", &pdf)).await;

    let (status, body) = send(&app.router, json_request("/chat", "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn given_two_uploads_when_chat_then_only_latest_document_is_used() {
    let app = create_test_app();
    send(
        &app.router,
        upload_request("first.pdf", &pdf_with_text("Alpha particles are helium nuclei.")),
    )
    .await;
    send(
        &app.router,
        upload_request("second.pdf", &pdf_with_text("Beta decay emits electrons.")),
    )
    .await;

    let status = app.orchestrator.status();
    assert_eq!(status.label.as_deref(), Some("second.pdf"));
    assert_eq!(status.chunk_count, 1);

    let (_, body) = send(&app.router, json_request("/chat", r#"{"query": "decay?"}"#)).await;
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.contains("Beta decay emits electrons."));
    assert!(!answer.contains("Alpha particles"));
}

#[tokio::test]
async fn given_missing_url_when_add_youtube_then_returns_bad_request() {
    let app = create_test_app();

    let (status, body) = send(&app.router, json_request("/add-youtube", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No YouTube URL provided");
}

#[tokio::test]
async fn given_malformed_url_when_add_youtube_then_returns_bad_request() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        json_request("/add-youtube", r#"{"url": "https://example.com/watch"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid YouTube URL");
}

#[tokio::test]
async fn given_video_without_subtitles_when_add_youtube_then_returns_bad_request() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        json_request(
            "/add-youtube",
            &format!(r#"{{"url": "https://youtu.be/{}"}}"#, SILENT_VIDEO_ID),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "This video has no subtitles or they are disabled."
    );
}

#[tokio::test]
async fn given_private_video_when_add_youtube_then_returns_bad_request() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        json_request(
            "/add-youtube",
            &format!(
                r#"{{"url": "https://www.youtube.com/watch?v={}"}}"#,
                PRIVATE_VIDEO_ID
            ),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Video is unavailable or private.");
}

#[tokio::test]
async fn given_video_with_transcript_when_add_youtube_then_youtube_becomes_source() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        json_request(
            "/add-youtube",
            &format!(
                r#"{{"url": "https://www.youtube.com/watch?v={}&t=42s"}}"#,
                VIDEO_ID
            ),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "YouTube transcript loaded successfully!");
    assert_eq!(body["video_id"], VIDEO_ID);
    assert_eq!(body["duration_seconds"], 7.5);

    let (_, health) = send(&app.router, health_request()).await;
    assert_eq!(health["source"], "youtube");

    let (_, chat) = send(&app.router, json_request("/chat", r#"{"query": "What builds proteins?"}"#)).await;
    assert!(chat["answer"]
        .as_str()
        .unwrap()
        .contains("Today we talk about ribosomes. They build proteins."));
}

#[tokio::test]
async fn given_persisted_index_when_new_orchestrator_starts_then_index_is_restored() {
    let app = create_test_app();
    let pdf = pdf_with_text("Photosynthesis happens in chloroplasts.");
    send(&app.router, upload_request("plants.pdf", &pdf)).await;

    let restarted = build_orchestrator(app.dir.path());
    assert!(!restarted.status().loaded);
    assert!(restarted.load_persisted().await);

    let status = restarted.status();
    assert!(status.loaded);
    assert_eq!(status.label.as_deref(), Some("plants.pdf"));

    let response = assert_ok!(restarted.ask("Where does photosynthesis happen?").await);
    let response = response.unwrap();
    assert!(response.answer.contains("chloroplasts"));
    assert_eq!(response.sources.len(), 1);
}

#[tokio::test]
async fn given_concurrent_uploads_when_both_finish_then_disk_and_memory_agree_on_last_writer() {
    let dir = TempDir::new().unwrap();
    let orchestrator = build_orchestrator_with(dir.path(), Arc::new(DelayedEmbedder));

    let slow_pdf = pdf_with_text("Glaciers move slowly across valleys.");
    let fast_pdf = pdf_with_text("Lightning is an electrostatic discharge.");
    let (slow, fast) = tokio::join!(
        orchestrator.ingest_pdf("slow.pdf", slow_pdf),
        orchestrator.ingest_pdf("fast.pdf", fast_pdf),
    );
    assert_ok!(slow);
    assert_ok!(fast);

    let active = orchestrator.status();
    assert_eq!(active.label.as_deref(), Some("slow.pdf"));

    let restarted = build_orchestrator(dir.path());
    assert!(restarted.load_persisted().await);
    assert_eq!(restarted.status().label, active.label);
    assert_eq!(restarted.status().chunk_count, active.chunk_count);
}

#[tokio::test]
async fn given_json_body_when_upload_then_returns_json_error() {
    let app = create_test_app();

    let (status, body) = send(&app.router, json_request("/upload", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
    assert!(!app.orchestrator.status().loaded);
}
