//! Document sources for Primer.
//!
//! A source turns raw input (PDF bytes, a YouTube URL) into plain text units
//! ready for chunking.

pub mod pdf;
pub mod youtube;

pub use pdf::{extract_pages, is_pdf_file_name, sanitize_file_name, PdfPage};
pub use youtube::{
    extract_video_id, TrackKind, Transcript, TranscriptSegment, TranscriptSource, YtDlpTranscripts,
};

use serde::{Deserialize, Serialize};

/// Type of the document behind the active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    YouTube,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::YouTube => write!(f, "youtube"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "youtube" => Ok(SourceKind::YouTube),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}
