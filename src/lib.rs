//! Penmark backend: answers questions from pasted source material.
//!
//! The retrieval core lives in [`rag`]; [`qa`] wraps it into the
//! validate, select, prompt and generate pipeline served by [`server`].

pub mod core;
pub mod llm;
pub mod qa;
pub mod rag;
pub mod server;
pub mod state;
