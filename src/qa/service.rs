use std::sync::Arc;

use serde::Serialize;

use super::error::QaError;
use super::prompt::build_prompt;
use super::request::{validate, validate_select, QaRequest, SelectRequest};
use crate::core::config::ConfigService;
use crate::llm::LlmProvider;
use crate::rag::{
    chunk_text, query_terms, rank_chunks, select_relevant, ContextBuilder, ContextBuilderConfig,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QaAnswer {
    pub answer: String,
    pub question: String,
    pub chunks_used: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedChunk {
    pub index: usize,
    pub score: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub chunk_count: usize,
    pub query_terms: Vec<String>,
    pub selected: Vec<SelectedChunk>,
}

#[derive(Clone)]
pub struct QaService {
    config: ConfigService,
    llm: Arc<dyn LlmProvider>,
}

impl QaService {
    pub fn new(config: ConfigService, llm: Arc<dyn LlmProvider>) -> Self {
        Self { config, llm }
    }

    /// Answer `request.question` from its source text.
    pub async fn answer(&self, request: &QaRequest) -> Result<QaAnswer, QaError> {
        let settings = self.config.settings()?;
        validate(request, &settings.qa)?;

        let chunks = chunk_text(request.source_text.trim(), settings.retrieval.chunk_size);
        tracing::info!("Created {} chunks from source material", chunks.len());

        let selected = select_relevant(&chunks, &request.question, settings.retrieval.max_chunks);
        tracing::info!("Selected {} relevant chunks", selected.len());
        if selected.is_empty() {
            return Err(QaError::NoRelevantMaterial);
        }

        let context = ContextBuilder::new(ContextBuilderConfig {
            separator: settings.retrieval.context_separator.clone(),
            max_context_length: settings.retrieval.max_context_length,
        })
        .build(&selected);

        let prompt = build_prompt(
            &request.style_samples,
            &context,
            &request.question,
            request.answer_length,
        );

        tracing::debug!(
            "Calling {} with {} chars of context",
            self.llm.name(),
            context.len()
        );
        let answer = self.llm.chat(prompt).await?;
        if answer.trim().is_empty() {
            return Err(QaError::EmptyAnswer);
        }

        Ok(QaAnswer {
            answer,
            question: request.question.clone(),
            chunks_used: selected.len(),
        })
    }

    /// Run chunking and selection only, reporting scores.
    pub fn select(&self, request: &SelectRequest) -> Result<SelectionReport, QaError> {
        let settings = self.config.settings()?;
        validate_select(request, &settings.qa)?;

        let chunk_size = request.chunk_size.unwrap_or(settings.retrieval.chunk_size);
        let max_chunks = request.max_chunks.unwrap_or(settings.retrieval.max_chunks);

        let chunks = chunk_text(request.source_text.trim(), chunk_size);
        let ranked = rank_chunks(&chunks, &request.question, max_chunks);
        for scored in &ranked {
            tracing::debug!("chunk {} scored {}", scored.chunk.index, scored.score);
        }

        Ok(SelectionReport {
            chunk_count: chunks.len(),
            query_terms: query_terms(&request.question),
            selected: ranked
                .into_iter()
                .map(|scored| SelectedChunk {
                    index: scored.chunk.index,
                    score: scored.score,
                    text: scored.chunk.text,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    use crate::core::config::AppPaths;
    use crate::core::errors::ApiError;
    use crate::llm::ChatRequest;

    struct ScriptedProvider {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }
    }

    fn service_with(provider: Arc<ScriptedProvider>, config: serde_json::Value) -> (TempDir, QaService) {
        let dir = tempdir().unwrap();
        let paths = AppPaths::from_dirs(dir.path().to_path_buf(), dir.path().to_path_buf());
        let config_service = ConfigService::new(Arc::new(paths));
        config_service.update_config(config, true).unwrap();
        (dir, QaService::new(config_service, provider))
    }

    fn numbered_words(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("w{}", i)).collect()
    }

    #[tokio::test]
    async fn answer_uses_best_chunks_in_prompt() {
        let provider = ScriptedProvider::new("Cats purr.");
        let (_dir, service) = service_with(
            provider.clone(),
            json!({ "retrieval": { "chunk_size": 4, "max_chunks": 2 } }),
        );
        let source = "dogs bark at night cats purr when happy cats nap cats eat birds fly south";
        let request = QaRequest::new("What do cats do?", source);

        let answer = service.answer(&request).await.unwrap();

        assert_eq!(answer.answer, "Cats purr.");
        assert_eq!(answer.question, "What do cats do?");
        assert_eq!(answer.chunks_used, 2);

        let seen = provider.seen.lock().unwrap();
        let user = &seen[0].messages[1].content;
        assert!(user.contains("<source>\ncats nap cats eat\n\n---\n\ncats purr when happy\n</source>"));
    }

    #[tokio::test]
    async fn answer_rejects_blank_model_output() {
        let (_dir, service) = service_with(ScriptedProvider::new("  \n"), json!({}));

        let result = service.answer(&QaRequest::new("question", "some source")).await;

        assert!(matches!(result, Err(QaError::EmptyAnswer)));
    }

    #[tokio::test]
    async fn answer_validates_before_calling_model() {
        let provider = ScriptedProvider::new("unused");
        let (_dir, service) = service_with(provider.clone(), json!({}));

        let result = service.answer(&QaRequest::new("question", "   ")).await;

        assert!(matches!(result, Err(QaError::Invalid(_))));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_selection_is_reported_without_calling_model() {
        let provider = ScriptedProvider::new("unused");
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("config.yml"), "retrieval:\n  max_chunks: 0\n").unwrap();
        let paths = AppPaths::from_dirs(dir.path().to_path_buf(), dir.path().to_path_buf());
        let service = QaService::new(ConfigService::new(Arc::new(paths)), provider.clone());

        let result = service
            .answer(&QaRequest::new("What about cells?", "cells divide and cells grow"))
            .await;

        assert!(matches!(result, Err(QaError::NoRelevantMaterial)));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn select_reports_scores_for_twelve_hundred_words() {
        let (_dir, service) = service_with(ScriptedProvider::new(""), json!({}));
        let mut words = numbered_words(1200);
        words[1100] = "mitochondria".to_string();
        words[1150] = "mitochondria".to_string();
        words[10] = "mitochondria".to_string();
        let request = SelectRequest {
            question: "Explain mitochondria".to_string(),
            source_text: words.join(" "),
            chunk_size: None,
            max_chunks: Some(2),
        };

        let report = service.select(&request).unwrap();

        assert_eq!(report.chunk_count, 3);
        assert_eq!(report.query_terms, vec!["explain", "mitochondria"]);
        let picked: Vec<(usize, usize)> =
            report.selected.iter().map(|c| (c.index, c.score)).collect();
        assert_eq!(picked, vec![(2, 2), (0, 1)]);
    }

    #[tokio::test]
    async fn select_without_terms_keeps_document_order() {
        let (_dir, service) = service_with(ScriptedProvider::new(""), json!({}));
        let request = SelectRequest {
            question: "why is it".to_string(),
            source_text: "a b c d e f".to_string(),
            chunk_size: Some(2),
            max_chunks: Some(2),
        };

        let report = service.select(&request).unwrap();

        assert!(report.query_terms.is_empty());
        let indices: Vec<usize> = report.selected.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(report.selected.iter().all(|c| c.score == 0));
    }
}
