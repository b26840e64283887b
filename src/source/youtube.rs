//! YouTube transcript source.
//!
//! Caption tracks are discovered with `yt-dlp --dump-json` and downloaded in
//! YouTube's `json3` timed-text format.

use crate::error::{PrimerError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, instrument};

static VIDEO_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:v=|/)([0-9A-Za-z_-]{11})",
        r"embed/([0-9A-Za-z_-]{11})",
        r"youtu\.be/([0-9A-Za-z_-]{11})",
        r"^([0-9A-Za-z_-]{11})$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

/// Extract the 11-character video ID from a YouTube URL or a bare ID.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// A timed line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Whether a caption track was uploaded by the creator or generated by YouTube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Manual,
    Generated,
}

/// A fetched video transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: Option<String>,
    pub language: String,
    pub kind: TrackKind,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// End of the last segment, or 0 for an empty transcript.
    pub fn duration_seconds(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.start + s.duration)
            .unwrap_or(0.0)
    }

    /// All segment texts joined with single spaces.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the best available transcript for a video.
    async fn fetch(&self, video_id: &str) -> Result<Transcript>;
}

/// Transcript source backed by yt-dlp.
pub struct YtDlpTranscripts {
    ytdlp_path: String,
    languages: Vec<String>,
    http: reqwest::Client,
}

impl YtDlpTranscripts {
    pub fn new(ytdlp_path: &str, languages: Vec<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            ytdlp_path: ytdlp_path.to_string(),
            languages,
            http,
        })
    }

    async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PrimerError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    PrimerError::VideoSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp failed: {}", stderr);
            if is_unavailable_message(&stderr) {
                return Err(PrimerError::VideoUnavailable);
            }
            return Err(PrimerError::VideoSource(format!(
                "yt-dlp failed for {}: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| PrimerError::VideoSource(format!("Failed to parse yt-dlp output: {}", e)))
    }
}

#[async_trait]
impl TranscriptSource for YtDlpTranscripts {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        let info = self.video_info(video_id).await?;
        let track = select_track(&info, &self.languages).ok_or(PrimerError::NoTranscript)?;

        info!(
            "Using {:?} caption track '{}' for {}",
            track.kind, track.language, video_id
        );

        let body = self
            .http
            .get(&track.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_json3(&body)?;
        if segments.is_empty() {
            return Err(PrimerError::NoTranscript);
        }

        Ok(Transcript {
            video_id: video_id.to_string(),
            title: info.title,
            language: track.language,
            kind: track.kind,
            segments,
        })
    }
}

fn is_unavailable_message(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    ["video unavailable", "private video", "this video is private", "has been removed"]
        .iter()
        .any(|m| lower.contains(m))
}

/// The subset of yt-dlp's `--dump-json` output used here.
#[derive(Debug, Default, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    #[serde(default)]
    subtitles: BTreeMap<String, Vec<CaptionFormat>>,
    #[serde(default)]
    automatic_captions: BTreeMap<String, Vec<CaptionFormat>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionFormat {
    #[serde(default)]
    ext: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Clone, PartialEq)]
struct SelectedTrack {
    language: String,
    kind: TrackKind,
    url: String,
}

fn language_matches(code: &str, preferred: &str) -> bool {
    code == preferred || code.starts_with(&format!("{}-", preferred))
}

/// Pick a caption track: preferred-language manual, preferred-language generated,
/// any manual, any generated. Only tracks offering `json3` are considered.
fn select_track(info: &VideoInfo, languages: &[String]) -> Option<SelectedTrack> {
    let json3 = |formats: &Vec<CaptionFormat>| {
        formats.iter().find(|f| f.ext == "json3").map(|f| f.url.clone())
    };

    let candidates = |tracks: &BTreeMap<String, Vec<CaptionFormat>>, kind: TrackKind| {
        tracks
            .iter()
            .filter(|(code, _)| code.as_str() != "live_chat")
            .filter_map(|(code, formats)| {
                json3(formats).map(|url| SelectedTrack {
                    language: code.clone(),
                    kind,
                    url,
                })
            })
            .collect::<Vec<_>>()
    };

    let manual = candidates(&info.subtitles, TrackKind::Manual);
    let generated = candidates(&info.automatic_captions, TrackKind::Generated);

    for preferred in languages {
        for pool in [&manual, &generated] {
            if let Some(track) = pool.iter().find(|t| language_matches(&t.language, preferred)) {
                return Some(track.clone());
            }
        }
    }

    manual.into_iter().next().or_else(|| generated.into_iter().next())
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` caption document into segments, dropping empty events.
fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let doc: Json3 = serde_json::from_str(body)?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(
                text,
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms as f64 / 1000.0,
            ))
        })
        .collect())
}
