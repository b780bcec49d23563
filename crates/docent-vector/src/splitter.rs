//! Character-bounded text splitter.
//!
//! Wraps `text_splitter::TextSplitter`, which descends through semantic
//! levels coarsest first (paragraph, line, sentence, word, character) and
//! only falls to a finer level for sections that still exceed the bound.
//! Adjacent sections are merged up to `chunk_size`. Lengths are counted in
//! characters, and every emitted chunk is trimmed and non-empty.

use std::sync::Arc;

use text_splitter::{Characters, ChunkConfig, TextSplitter};

use docent_core::config::IngestConfig;
use docent_core::error::DocentError;

#[derive(Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    inner: Arc<TextSplitter<Characters>>,
}

impl std::fmt::Debug for RecursiveTextSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveTextSplitter")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish()
    }
}

fn build(chunk_size: usize, chunk_overlap: usize) -> Result<TextSplitter<Characters>, DocentError> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(chunk_overlap)
        .map_err(|e| DocentError::Config(format!("Invalid splitter settings: {}", e)))?
        .with_trim(true);
    Ok(TextSplitter::new(config))
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, DocentError> {
        if chunk_size == 0 {
            return Err(DocentError::Config("chunk_size must be > 0".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(DocentError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            inner: Arc::new(build(chunk_size, chunk_overlap)?),
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self, DocentError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into trimmed, non-empty chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_with_offsets(text)
            .into_iter()
            .map(|(_, chunk)| chunk)
            .collect()
    }

    /// Like `split_text`, paired with each chunk's character offset in `text`.
    pub fn split_with_offsets(&self, text: &str) -> Vec<(usize, String)> {
        let mut chars_seen = 0usize;
        let mut bytes_seen = 0usize;
        self.inner
            .chunk_indices(text)
            .filter(|(_, chunk)| !chunk.trim().is_empty())
            .map(|(byte_offset, chunk)| {
                // Count incrementally; offsets only step back under overlap.
                if byte_offset >= bytes_seen {
                    chars_seen += text[bytes_seen..byte_offset].chars().count();
                } else {
                    chars_seen = text[..byte_offset].chars().count();
                }
                bytes_seen = byte_offset;
                (chars_seen, chunk.trim().to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = RecursiveTextSplitter::new(450, 0).unwrap();
        let chunks = splitter.split_text("  A short paragraph.  ");
        assert_eq!(chunks, vec!["A short paragraph."]);
    }

    #[test]
    fn test_empty_and_whitespace_text_yield_nothing() {
        let splitter = RecursiveTextSplitter::new(450, 0).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n \n ").is_empty());
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = RecursiveTextSplitter::new(450, 0).unwrap();
        let paragraph = "word ".repeat(60);
        let text = vec![paragraph.clone(); 8].join("\n\n");

        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 450, "chunk too long: {}", chunk.len());
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_single_newline_document_is_bounded() {
        let splitter = RecursiveTextSplitter::new(450, 0).unwrap();
        let text = "line of text here\n".repeat(56);

        let chunks = splitter.split_text(&text);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 450));
        assert_eq!(non_whitespace(&chunks.concat()), non_whitespace(&text));
    }

    #[test]
    fn test_paragraphs_merge_until_full() {
        let splitter = RecursiveTextSplitter::new(10, 0).unwrap();
        let chunks = splitter.split_text("aaa\n\nbbb\n\nccc");
        assert_eq!(chunks, vec!["aaa\n\nbbb", "ccc"]);
    }

    #[test]
    fn test_falls_back_to_finer_levels() {
        let splitter = RecursiveTextSplitter::new(5, 0).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcde", "fghij"]);
    }

    #[test]
    fn test_no_content_lost_without_overlap() {
        let splitter = RecursiveTextSplitter::new(20, 0).unwrap();
        let text = "The quick brown fox\njumps over the lazy dog.\n\nIt was not amused.";
        let chunks = splitter.split_text(text);
        assert_eq!(non_whitespace(&chunks.concat()), non_whitespace(text));
    }

    #[test]
    fn test_overlap_repeats_content() {
        let splitter = RecursiveTextSplitter::new(12, 6).unwrap();
        let text = "a b c d e f g h i j k l m n o p";
        let chunks = splitter.split_text(text);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        assert!(non_whitespace(&chunks.concat()).len() > non_whitespace(text).len());
    }

    #[test]
    fn test_multibyte_counts_characters() {
        let splitter = RecursiveTextSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("éééééééé");
        assert_eq!(chunks, vec!["éééé", "éééé"]);
    }

    #[test]
    fn test_offsets_are_in_characters() {
        let splitter = RecursiveTextSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_with_offsets("ééé\n\nabc");
        assert_eq!(chunks, vec![(0, "ééé".to_string()), (5, "abc".to_string())]);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            RecursiveTextSplitter::new(0, 0),
            Err(DocentError::Config(_))
        ));
        assert!(matches!(
            RecursiveTextSplitter::new(10, 10),
            Err(DocentError::Config(_))
        ));
    }
}
