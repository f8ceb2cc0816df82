use serde::{Deserialize, Serialize};

use super::error::QaError;
use crate::core::config::QaSettings;

const BLOCKED_MARKERS: [&str; 2] = ["<script>", "javascript:"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl AnswerLength {
    pub fn max_sentences(self) -> usize {
        match self {
            AnswerLength::Short => 3,
            AnswerLength::Medium => 5,
            AnswerLength::Long => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLength::Short => "short",
            AnswerLength::Medium => "medium",
            AnswerLength::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default, alias = "sourceFile")]
    pub source_text: String,
    #[serde(default)]
    pub answer_length: AnswerLength,
    /// Writing samples whose voice the answer should follow
    #[serde(default)]
    pub style_samples: Vec<String>,
}

impl QaRequest {
    pub fn new(question: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            source_text: source_text.into(),
            answer_length: AnswerLength::default(),
            style_samples: Vec::new(),
        }
    }
}

/// Body of `POST /api/rag/select`: run retrieval only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default, alias = "sourceFile")]
    pub source_text: String,
    pub chunk_size: Option<usize>,
    pub max_chunks: Option<usize>,
}

pub fn validate(request: &QaRequest, settings: &QaSettings) -> Result<(), QaError> {
    validate_inputs(&request.question, &request.source_text, settings)
}

pub fn validate_select(request: &SelectRequest, settings: &QaSettings) -> Result<(), QaError> {
    validate_inputs(&request.question, &request.source_text, settings)?;
    if request.chunk_size == Some(0) {
        return Err(QaError::Invalid("chunkSize must be at least 1".to_string()));
    }
    if request.max_chunks == Some(0) {
        return Err(QaError::Invalid("maxChunks must be at least 1".to_string()));
    }
    Ok(())
}

fn validate_inputs(question: &str, source_text: &str, settings: &QaSettings) -> Result<(), QaError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(QaError::Invalid("Question is required".to_string()));
    }
    if question.chars().count() > settings.max_question_length {
        return Err(QaError::Invalid(format!(
            "Question exceeds maximum length of {} characters",
            settings.max_question_length
        )));
    }

    let source = source_text.trim();
    if source.is_empty() {
        return Err(QaError::Invalid("Source material is required".to_string()));
    }
    if source.chars().count() > settings.max_source_length {
        return Err(QaError::Invalid(format!(
            "Source material exceeds maximum length of {} characters",
            settings.max_source_length
        )));
    }

    if contains_blocked_marker(question) || contains_blocked_marker(source) {
        return Err(QaError::Invalid(
            "Input contains potentially malicious content".to_string(),
        ));
    }

    Ok(())
}

fn contains_blocked_marker(text: &str) -> bool {
    BLOCKED_MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid_message(result: Result<(), QaError>) -> String {
        match result {
            Err(QaError::Invalid(msg)) => msg,
            other => panic!("expected invalid request, got {:?}", other),
        }
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let request: QaRequest = serde_json::from_value(json!({
            "question": "What happened?",
            "sourceText": "Things happened."
        }))
        .unwrap();

        assert_eq!(request.answer_length, AnswerLength::Medium);
        assert!(request.style_samples.is_empty());

        let request: QaRequest = serde_json::from_value(json!({
            "question": "q",
            "sourceFile": "file text",
            "answerLength": "short"
        }))
        .unwrap();
        assert_eq!(request.source_text, "file text");
        assert_eq!(request.answer_length.max_sentences(), 3);
    }

    #[test]
    fn rejects_unknown_answer_length() {
        let result = serde_json::from_value::<QaRequest>(json!({ "answerLength": "epic" }));
        assert!(result.is_err());
    }

    #[test]
    fn blank_question_or_source_is_rejected() {
        let settings = QaSettings::default();

        let msg = invalid_message(validate(&QaRequest::new("   ", "source"), &settings));
        assert_eq!(msg, "Question is required");

        let msg = invalid_message(validate(&QaRequest::new("question", " \n\t"), &settings));
        assert_eq!(msg, "Source material is required");
    }

    #[test]
    fn over_length_input_is_rejected() {
        let settings = QaSettings {
            max_question_length: 5,
            max_source_length: 10,
        };

        let msg = invalid_message(validate(&QaRequest::new("too long", "src"), &settings));
        assert!(msg.contains("5 characters"));

        let msg = invalid_message(validate(
            &QaRequest::new("ok", "this source is long"),
            &settings,
        ));
        assert!(msg.contains("10 characters"));
    }

    #[test]
    fn script_markers_are_rejected() {
        let settings = QaSettings::default();
        let request = QaRequest::new("what <script>alert(1)</script>", "source");

        let msg = invalid_message(validate(&request, &settings));

        assert_eq!(msg, "Input contains potentially malicious content");
        assert!(validate(&QaRequest::new("q", "see javascript:void(0)"), &settings).is_err());
    }

    #[test]
    fn select_rejects_zero_overrides() {
        let settings = QaSettings::default();
        let request = SelectRequest {
            question: "q".to_string(),
            source_text: "s".to_string(),
            chunk_size: Some(0),
            max_chunks: None,
        };

        assert!(validate_select(&request, &settings).is_err());
    }
}
