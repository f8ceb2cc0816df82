//! Word-window chunking.
//!
//! Splits a source document into non-overlapping windows of a fixed number of
//! whitespace-delimited words. Windows are rejoined with single spaces, so the
//! chunks together reproduce the whitespace-normalized word sequence exactly.

use serde::{Deserialize, Serialize};

/// Words per chunk when the caller does not configure one.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// A contiguous slice of a document's words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the source document (0-based)
    pub index: usize,
    /// Words of the window joined by single spaces
    pub text: String,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Number of words in the chunk.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Split `document` into chunks of `chunk_size` words.
///
/// The final chunk holds the remainder when the word count is not a multiple
/// of `chunk_size`. An empty or whitespace-only document yields no chunks.
/// A `chunk_size` of zero is treated as one.
pub fn chunk_text(document: &str, chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let words: Vec<&str> = document.split_whitespace().collect();

    words
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, window)| Chunk::new(index, window.join(" ")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_document_produces_no_chunks() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("   \n\t  ", 500).is_empty());
    }

    #[test]
    fn chunks_hold_fixed_word_windows() {
        let chunks = chunk_text(&numbered_words(1200), 500);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].word_count(), 500);
        assert_eq!(chunks[1].word_count(), 500);
        assert_eq!(chunks[2].word_count(), 200);
        assert!(chunks[1].text.starts_with("w500 "));
        assert!(chunks[2].text.ends_with(" w1199"));
    }

    #[test]
    fn chunk_count_is_ceiling_of_word_count() {
        for (words, size, expected) in [(1, 3, 1), (3, 3, 1), (4, 3, 2), (10, 1, 10), (7, 100, 1)] {
            let chunks = chunk_text(&numbered_words(words), size);
            assert_eq!(chunks.len(), expected, "{} words / size {}", words, size);
        }
    }

    #[test]
    fn chunks_cover_every_word_once_in_order() {
        let document = "  The quick\tbrown fox\n\njumps over   the lazy dog.  ";
        let chunks = chunk_text(document, 3);

        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = document.split_whitespace().collect::<Vec<_>>().join(" ");

        assert_eq!(rejoined, normalized);
        assert_eq!(
            chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn zero_chunk_size_is_treated_as_one() {
        let chunks = chunk_text("alpha beta", 0);
        assert_eq!(chunks, vec![Chunk::new(0, "alpha"), Chunk::new(1, "beta")]);
    }
}
