//! RAG context assembly.
//!
//! Joins the selected chunks into the source block handed to the model.

use serde::{Deserialize, Serialize};

use super::chunker::Chunk;

/// Separator placed between chunks when none is configured.
pub const DEFAULT_SEPARATOR: &str = "\n\n---\n\n";

/// Configuration for context building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBuilderConfig {
    /// Text placed between consecutive chunks
    pub separator: String,
    /// Maximum total context length in characters (unbounded when `None`)
    pub max_context_length: Option<usize>,
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            max_context_length: None,
        }
    }
}

/// Builds the source context string from ranked chunks.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    config: ContextBuilderConfig,
}

impl ContextBuilder {
    pub fn new(config: ContextBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextBuilderConfig {
        &self.config
    }

    /// Join `chunks` in the given order.
    ///
    /// With a length cap, whole chunks are appended until the next one would
    /// overflow it. The first chunk is always kept.
    pub fn build(&self, chunks: &[Chunk]) -> String {
        let separator = self.config.separator.as_str();
        let mut context = String::new();
        let mut current_length = 0;

        for (i, chunk) in chunks.iter().enumerate() {
            let addition = if i == 0 {
                chunk.text.chars().count()
            } else {
                separator.chars().count() + chunk.text.chars().count()
            };

            if let Some(max_length) = self.config.max_context_length {
                if i > 0 && current_length + addition > max_length {
                    tracing::debug!(
                        "Context cap of {} chars reached after {} chunks",
                        max_length,
                        i
                    );
                    break;
                }
            }

            if i > 0 {
                context.push_str(separator);
            }
            context.push_str(&chunk.text);
            current_length += addition;
        }

        context
    }
}

/// Join chunks with `separator`, without a length cap.
pub fn build_context(chunks: &[Chunk], separator: &str) -> String {
    ContextBuilder::new(ContextBuilderConfig {
        separator: separator.to_string(),
        max_context_length: None,
    })
    .build(chunks)
}
