//! Configuration settings for Primer.

use crate::chunking::ChunkingStrategy;
use crate::error::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub ollama: OllamaSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub chunking: ChunkingSettings,
    pub rag: RagSettings,
    pub youtube: YoutubeSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Timeout for outbound HTTP requests (models, captions).
    pub request_timeout_secs: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.primer".to_string(),
            request_timeout_secs: 300,
        }
    }
}

impl GeneralSettings {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Maximum request body size in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            max_upload_mb: 50,
        }
    }
}

/// Where uploaded files and the persisted index live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub pdf_dir: String,
    pub index_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            pdf_dir: "~/.primer/pdfs".to_string(),
            index_path: "~/.primer/index.db".to_string(),
        }
    }
}

/// Upper bound for `ollama.max_retries`; backoff doubles on every retry.
pub const MAX_OLLAMA_RETRIES: u32 = 10;

/// Connection settings for a local Ollama server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            max_retries: 2,
        }
    }
}

/// Model provider type, shared by embeddings and generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server (default).
    #[default]
    Ollama,
    /// OpenAI API, keyed by `OPENAI_API_KEY`.
    OpenAI,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: Provider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            // all-MiniLM-L6-v2
            model: "all-minilm".to_string(),
            dimensions: 384,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: "llama2:7b".to_string(),
            temperature: 0.3,
        }
    }
}

/// Content chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub strategy: ChunkingStrategy,
    /// Chunk size for PDF pages, in characters.
    pub pdf_chunk_size: usize,
    pub pdf_chunk_overlap: usize,
    /// Chunk size for video transcripts, in characters.
    pub transcript_chunk_size: usize,
    pub transcript_chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::Recursive,
            pdf_chunk_size: 500,
            pdf_chunk_overlap: 100,
            transcript_chunk_size: 800,
            transcript_chunk_overlap: 100,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// yt-dlp executable.
    pub ytdlp_path: String,
    /// Preferred caption languages, most preferred first.
    pub languages: Vec<String>,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            languages: vec!["en".to_string()],
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PrimerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            ("pdf", self.chunking.pdf_chunk_size, self.chunking.pdf_chunk_overlap),
            (
                "transcript",
                self.chunking.transcript_chunk_size,
                self.chunking.transcript_chunk_overlap,
            ),
        ];
        for (name, size, overlap) in pairs {
            if size == 0 {
                return Err(PrimerError::Config(format!("{}_chunk_size must be positive", name)));
            }
            if overlap >= size {
                return Err(PrimerError::Config(format!(
                    "{name}_chunk_overlap ({overlap}) must be smaller than {name}_chunk_size ({size})"
                )));
            }
        }

        if self.rag.top_k == 0 {
            return Err(PrimerError::Config("rag.top_k must be at least 1".to_string()));
        }

        if self.ollama.max_retries > MAX_OLLAMA_RETRIES {
            return Err(PrimerError::Config(format!(
                "ollama.max_retries must be at most {}",
                MAX_OLLAMA_RETRIES
            )));
        }

        Ok(())
    }

    /// Set a dotted key (e.g. `llm.model`) to a value, keeping the value's TOML type.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self> {
        let mut doc = toml::Value::try_from(self).map_err(|e| PrimerError::Config(e.to_string()))?;

        let mut parts = key.split('.').peekable();
        let mut cursor = &mut doc;
        while let Some(part) = parts.next() {
            let table = cursor
                .as_table_mut()
                .ok_or_else(|| PrimerError::Config(format!("'{}' is not a section", key)))?;
            // Unset options and empty maps are absent from the serialized document.
            if !table.contains_key(part) && accepts_new_key(key) {
                let fresh = if parts.peek().is_none() {
                    toml::Value::String(String::new())
                } else {
                    toml::Value::Table(toml::map::Map::new())
                };
                table.insert(part.to_string(), fresh);
            }
            let slot = table
                .get_mut(part)
                .ok_or_else(|| PrimerError::Config(format!("Unknown configuration key: {}", key)))?;

            if parts.peek().is_none() {
                *slot = parse_like(slot, value)?;
                break;
            }
            cursor = slot;
        }

        let updated: Settings = doc
            .try_into()
            .map_err(|e: toml::de::Error| PrimerError::Config(e.to_string()))?;
        updated.validate()?;
        Ok(updated)
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("primer")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded PDF upload directory.
    pub fn pdf_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.pdf_dir)
    }

    /// Get the expanded index database path.
    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.storage.index_path)
    }
}

/// Keys that may be missing from the serialized settings but can still be set.
const OPTIONAL_KEYS: &[&str] = &["prompts.custom_dir"];
const OPEN_TABLES: &[&str] = &["prompts.variables."];

fn accepts_new_key(key: &str) -> bool {
    OPTIONAL_KEYS.contains(&key)
        || OPEN_TABLES.iter().any(|prefix| {
            key.strip_prefix(prefix)
                .is_some_and(|name| !name.is_empty() && !name.contains('.'))
        })
}

/// Parse `raw` into a TOML value of the same type as `current`.
fn parse_like(current: &toml::Value, raw: &str) -> Result<toml::Value> {
    let invalid = |kind: &str| PrimerError::Config(format!("Expected {} value, got '{}'", kind, raw));

    Ok(match current {
        toml::Value::Integer(_) => toml::Value::Integer(raw.parse().map_err(|_| invalid("an integer"))?),
        toml::Value::Float(_) => toml::Value::Float(raw.parse().map_err(|_| invalid("a float"))?),
        toml::Value::Boolean(_) => toml::Value::Boolean(raw.parse().map_err(|_| invalid("a boolean"))?),
        toml::Value::Array(_) => toml::Value::Array(
            raw.split(',')
                .map(|s| toml::Value::String(s.trim().to_string()))
                .collect(),
        ),
        toml::Value::Table(_) => return Err(invalid("a scalar")),
        _ => toml::Value::String(raw.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.llm.model, "llama2:7b");
        assert_eq!(settings.rag.top_k, 3);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut settings = Settings::default();
        settings.chunking.pdf_chunk_overlap = 500;
        assert!(matches!(settings.validate(), Err(PrimerError::Config(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            provider = "openai"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.provider, Provider::OpenAI);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert!((settings.llm.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(settings.embedding.provider, Provider::Ollama);
        assert_eq!(settings.chunking.transcript_chunk_size, 800);
    }

    #[test]
    fn test_with_value() {
        let settings = Settings::default();

        let updated = settings.with_value("server.port", "8080").unwrap();
        assert_eq!(updated.server.port, 8080);

        let updated = settings.with_value("llm.provider", "openai").unwrap();
        assert_eq!(updated.llm.provider, Provider::OpenAI);

        assert!(settings.with_value("server.port", "eighty").is_err());
        assert!(settings.with_value("server.nope", "1").is_err());
        assert!(settings.with_value("rag.top_k", "0").is_err());
    }

    #[test]
    fn test_max_retries_is_bounded() {
        let settings = Settings::default();
        assert!(settings.with_value("ollama.max_retries", "10").is_ok());
        assert!(matches!(
            settings.with_value("ollama.max_retries", "64"),
            Err(PrimerError::Config(_))
        ));
    }

    #[test]
    fn test_with_value_sets_unset_prompt_options() {
        let settings = Settings::default();

        let updated = settings.with_value("prompts.custom_dir", "/tmp/prompts").unwrap();
        assert_eq!(updated.prompts.custom_dir.as_deref(), Some("/tmp/prompts"));

        let updated = updated.with_value("prompts.variables.course", "BIO").unwrap();
        assert_eq!(updated.prompts.variables.get("course").map(String::as_str), Some("BIO"));
        assert_eq!(updated.prompts.custom_dir.as_deref(), Some("/tmp/prompts"));

        let updated = updated.with_value("prompts.variables.course", "CHEM").unwrap();
        assert_eq!(updated.prompts.variables["course"], "CHEM");

        assert!(settings.with_value("prompts.variables.", "x").is_err());
        assert!(settings.with_value("prompts.variables.a.b", "x").is_err());
        assert!(settings.with_value("prompts.other", "x").is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.youtube.languages = vec!["de".to_string(), "en".to_string()];
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.youtube.languages, vec!["de", "en"]);
    }
}
