//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `chunk_text`: splits a source document into fixed-size word chunks
//! - `select_relevant`: ranks chunks by whole-word overlap with a question
//! - `ContextBuilder`: joins the selected chunks into the prompt's source block

mod chunker;
mod context_builder;
mod selector;

pub use chunker::{chunk_text, Chunk, DEFAULT_CHUNK_SIZE};
pub use context_builder::{build_context, ContextBuilder, ContextBuilderConfig, DEFAULT_SEPARATOR};
pub use selector::{
    query_terms, rank_chunks, score_chunks, select_relevant, ScoredChunk, DEFAULT_MAX_CHUNKS,
};
