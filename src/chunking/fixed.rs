//! Fixed-window chunking implementation.

use super::{ChunkingConfig, TextSplitter};

/// Splits text into fixed-size character windows that overlap by a constant amount.
pub struct FixedWindowSplitter {
    config: ChunkingConfig,
}

impl FixedWindowSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }
}

impl TextSplitter for FixedWindowSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total_len = chars.len();
        let step = self.config.chunk_size - self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut offset = 0;
        while offset < total_len {
            let end = (offset + self.config.chunk_size).min(total_len);
            let window: String = chars[offset..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
            if end == total_len {
                break;
            }
            offset += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> FixedWindowSplitter {
        FixedWindowSplitter::new(ChunkingConfig::new(size, overlap).unwrap())
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = splitter(4, 1).split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_no_trailing_duplicate() {
        let chunks = splitter(5, 2).split_text("abcde");
        assert_eq!(chunks, vec!["abcde"]);
    }

    #[test]
    fn test_multibyte_characters() {
        let chunks = splitter(2, 0).split_text("äöüß");
        assert_eq!(chunks, vec!["äö", "üß"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(splitter(10, 2).split_text("").is_empty());
        assert!(splitter(10, 2).split_text("   ").is_empty());
    }
}
