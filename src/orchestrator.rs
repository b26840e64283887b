//! Pipeline orchestrator for Primer.
//!
//! Coordinates ingestion (extract, chunk, embed, index, persist) and answers
//! questions against whichever index is currently active.

use crate::chunking::{create_splitter, ChunkingConfig, TextChunk, TextUnit};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{PrimerError, Result};
use crate::llm::{create_model, LanguageModel};
use crate::rag::{RagEngine, RagResponse};
use crate::source::{
    extract_pages, extract_video_id, is_pdf_file_name, sanitize_file_name, SourceKind,
    TranscriptSource, YtDlpTranscripts,
};
use crate::index::{ActiveIndex, IndexSource, IndexStore, SqliteIndexStore, VectorIndex};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// The main orchestrator for the Primer pipeline.
pub struct Orchestrator {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    transcripts: Arc<dyn TranscriptSource>,
    store: Arc<dyn IndexStore>,
    rag: RagEngine,
    active: ActiveIndex,
    /// Serializes persist + swap so disk and memory agree on the last writer.
    publish_lock: Mutex<()>,
}

impl Orchestrator {
    /// Create an orchestrator from settings, with the configured backends.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = create_embedder(&settings)?;
        let model = create_model(&settings)?;
        let transcripts: Arc<dyn TranscriptSource> = Arc::new(YtDlpTranscripts::new(
            &settings.youtube.ytdlp_path,
            settings.youtube.languages.clone(),
            settings.general.request_timeout(),
        )?);
        let store: Arc<dyn IndexStore> = Arc::new(SqliteIndexStore::new(&settings.index_path())?);

        Ok(Self::with_components(
            settings,
            prompts,
            embedder,
            model,
            transcripts,
            store,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        transcripts: Arc<dyn TranscriptSource>,
        store: Arc<dyn IndexStore>,
    ) -> Self {
        let rag = RagEngine::new(model, embedder.clone(), prompts, settings.rag.top_k);

        Self {
            settings,
            embedder,
            transcripts,
            store,
            rag,
            active: ActiveIndex::new(),
            publish_lock: Mutex::new(()),
        }
    }

    /// Restore the last persisted index, if one exists and matches the
    /// configured embedding model. Returns whether an index was loaded.
    pub async fn load_persisted(&self) -> bool {
        match self.store.load().await {
            Ok(Some(index)) if index.embedding_model() != self.embedder.model() => {
                warn!(
                    "Ignoring persisted index built with {}, current embedding model is {}",
                    index.embedding_model(),
                    self.embedder.model()
                );
                false
            }
            Ok(Some(index)) => {
                info!(
                    "Restored {} index {} ({} chunks)",
                    index.source().kind,
                    index.source().label,
                    index.len()
                );
                self.active.replace(index);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to load persisted index: {}", e);
                false
            }
        }
    }

    /// Ingest an uploaded PDF and make it the active index.
    #[instrument(skip(self, bytes), fields(file_name = %file_name, size = bytes.len()))]
    pub async fn ingest_pdf(&self, file_name: &str, bytes: Vec<u8>) -> Result<PdfIngestResult> {
        let file_name = sanitize_file_name(file_name)
            .ok_or_else(|| PrimerError::InvalidInput("Invalid file name".to_string()))?;
        if !is_pdf_file_name(&file_name) {
            return Err(PrimerError::InvalidInput(
                "Only PDF files are allowed".to_string(),
            ));
        }

        let pdf_dir = self.settings.pdf_dir();
        tokio::fs::create_dir_all(&pdf_dir).await?;
        let saved_path = pdf_dir.join(&file_name);
        tokio::fs::write(&saved_path, &bytes).await?;
        info!("Saved upload to {:?}", saved_path);

        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|e| PrimerError::PdfExtraction(format!("Extraction task failed: {}", e)))??;
        let page_count = pages.len();

        let units: Vec<TextUnit> = pages
            .into_iter()
            .map(|page| TextUnit::new(Some(page.number), page.text))
            .collect();

        let config = ChunkingConfig::new(
            self.settings.chunking.pdf_chunk_size,
            self.settings.chunking.pdf_chunk_overlap,
        )?;
        let chunks = create_splitter(self.settings.chunking.strategy, config).split_units(&units);
        if chunks.is_empty() {
            return Err(PrimerError::InvalidInput(
                "No text could be extracted from the PDF".to_string(),
            ));
        }

        let chunk_count = self
            .publish(IndexSource::new(SourceKind::Pdf, file_name.clone()), chunks)
            .await?;

        Ok(PdfIngestResult {
            file_name,
            pages: page_count,
            chunks: chunk_count,
        })
    }

    /// Ingest a PDF from the local filesystem.
    pub async fn ingest_pdf_path(&self, path: &Path) -> Result<PdfIngestResult> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| PrimerError::InvalidInput(format!("Not a file: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        self.ingest_pdf(&file_name, bytes).await
    }

    /// Ingest a YouTube transcript and make it the active index.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn ingest_youtube(&self, url: &str) -> Result<YoutubeIngestResult> {
        let video_id = extract_video_id(url)
            .ok_or_else(|| PrimerError::InvalidInput("Invalid YouTube URL".to_string()))?;

        let transcript = self.transcripts.fetch(&video_id).await?;
        let text = transcript.full_text();
        if text.trim().is_empty() {
            return Err(PrimerError::NoTranscript);
        }
        info!(
            "Fetched {} transcript for {} ({} segments)",
            transcript.language,
            video_id,
            transcript.segments.len()
        );

        let config = ChunkingConfig::new(
            self.settings.chunking.transcript_chunk_size,
            self.settings.chunking.transcript_chunk_overlap,
        )?;
        let chunks = create_splitter(self.settings.chunking.strategy, config)
            .split_units(&[TextUnit::new(None, text)]);

        let chunk_count = self
            .publish(IndexSource::new(SourceKind::YouTube, video_id.clone()), chunks)
            .await?;

        Ok(YoutubeIngestResult {
            video_id,
            title: transcript.title.clone(),
            duration_seconds: transcript.duration_seconds(),
            chunks: chunk_count,
        })
    }

    /// Embed chunks, build the index, persist it and swap it in.
    async fn publish(&self, source: IndexSource, chunks: Vec<TextChunk>) -> Result<usize> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if let Some(bad) = embeddings
            .iter()
            .find(|e| e.len() != self.embedder.dimensions())
        {
            return Err(PrimerError::Embedding(format!(
                "Expected {}-dimensional embeddings from {}, got {}",
                self.embedder.dimensions(),
                self.embedder.model(),
                bad.len()
            )));
        }

        let index = VectorIndex::build(source, self.embedder.model(), chunks, embeddings)?;
        let chunk_count = index.len();

        let _guard = self.publish_lock.lock().await;
        self.store.save(&index).await?;
        let index = self.active.replace(index);

        info!(
            "Active index is now {} {} ({} chunks)",
            index.source().kind,
            index.source().label,
            chunk_count
        );
        Ok(chunk_count)
    }

    /// Answer a question from the active index. `None` when nothing is loaded.
    pub async fn ask(&self, question: &str) -> Result<Option<RagResponse>> {
        let Some(index) = self.active.snapshot() else {
            return Ok(None);
        };
        self.rag.answer(&index, question).await.map(Some)
    }

    /// Summary of the active index.
    pub fn status(&self) -> IndexStatus {
        match self.active.snapshot() {
            Some(index) => IndexStatus {
                loaded: true,
                source: Some(index.source().kind),
                label: Some(index.source().label.clone()),
                chunk_count: index.len(),
            },
            None => IndexStatus::default(),
        }
    }
}

/// Result of ingesting a PDF.
#[derive(Debug, Clone, Serialize)]
pub struct PdfIngestResult {
    pub file_name: String,
    pub pages: usize,
    pub chunks: usize,
}

/// Result of ingesting a YouTube transcript.
#[derive(Debug, Clone, Serialize)]
pub struct YoutubeIngestResult {
    pub video_id: String,
    pub title: Option<String>,
    pub duration_seconds: f64,
    pub chunks: usize,
}

/// Snapshot of what is currently indexed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStatus {
    pub loaded: bool,
    pub source: Option<SourceKind>,
    pub label: Option<String>,
    pub chunk_count: usize,
}
