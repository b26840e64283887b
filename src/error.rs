//! Error types for Primer.

use thiserror::Error;

/// Library-level error type for Primer operations.
#[derive(Error, Debug)]
pub enum PrimerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("This video has no subtitles or they are disabled.")]
    NoTranscript,

    #[error("Video is unavailable or private.")]
    VideoUnavailable,

    #[error("Media source error: {0}")]
    VideoSource(String),

    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

impl PrimerError {
    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PrimerError::InvalidInput(_) | PrimerError::NoTranscript | PrimerError::VideoUnavailable
        )
    }
}

/// Result type alias for Primer operations.
pub type Result<T> = std::result::Result<T, PrimerError>;
