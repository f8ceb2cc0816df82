//! Lexical relevance selection.
//!
//! Scores chunks by counting whole-word occurrences of the question's terms
//! and keeps the highest scoring ones. There is no term deduplication, no
//! inverse-document-frequency weighting and no length normalization: a term
//! that appears twice in the question is counted twice.

use regex::bytes::Regex;
use serde::Serialize;

use super::chunker::Chunk;

/// Chunks returned when the caller does not configure a limit.
pub const DEFAULT_MAX_CHUNKS: usize = 3;

/// Terms of this many characters or fewer are ignored.
const MIN_TERM_CHARS: usize = 3;

/// A chunk paired with its relevance score for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: usize,
}

/// Lower-cased question words longer than three characters, in question order.
pub fn query_terms(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_TERM_CHARS)
        .map(str::to_string)
        .collect()
}

/// Score every chunk against `question`, preserving input order.
pub fn score_chunks(chunks: &[Chunk], question: &str) -> Vec<ScoredChunk> {
    let matchers: Vec<Regex> = query_terms(question)
        .iter()
        .filter_map(|term| whole_word_matcher(term))
        .collect();

    chunks
        .iter()
        .map(|chunk| {
            let haystack = chunk.text.to_lowercase();
            let score = matchers
                .iter()
                .map(|matcher| matcher.find_iter(haystack.as_bytes()).count())
                .sum();
            ScoredChunk {
                chunk: chunk.clone(),
                score,
            }
        })
        .collect()
}

/// Rank chunks by relevance to `question` and keep the first `max_chunks`.
///
/// Ties keep their input order. Zero-score chunks are not filtered out, so a
/// question with no usable terms returns the leading chunks unchanged.
pub fn select_relevant(chunks: &[Chunk], question: &str, max_chunks: usize) -> Vec<Chunk> {
    rank_chunks(chunks, question, max_chunks)
        .into_iter()
        .map(|scored| scored.chunk)
        .collect()
}

/// Same ordering as [`select_relevant`], keeping the scores.
pub fn rank_chunks(chunks: &[Chunk], question: &str, max_chunks: usize) -> Vec<ScoredChunk> {
    let mut scored = score_chunks(chunks, question);
    // stable: equal scores stay in input order
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(max_chunks);
    scored
}

// ASCII word boundaries: only [A-Za-z0-9_] count as word characters.
fn whole_word_matcher(term: &str) -> Option<Regex> {
    let pattern = format!(r"(?-u:\b){}(?-u:\b)", regex::escape(term));
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!("Skipping query term {:?}: {}", term, err);
            None
        }
    }
}
