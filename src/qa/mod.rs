//! Source-grounded question answering.
//!
//! Validates a question against its source material, selects the relevant
//! chunks and asks the configured model for an answer.

pub mod error;
pub mod prompt;
pub mod request;
pub mod service;

pub use error::QaError;
pub use prompt::build_prompt;
pub use request::{AnswerLength, QaRequest, SelectRequest};
pub use service::{QaAnswer, QaService, SelectedChunk, SelectionReport};
