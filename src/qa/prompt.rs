use super::request::AnswerLength;
use crate::llm::{ChatMessage, ChatRequest};

const SYSTEM_PROMPT: &str = "You answer questions using only the source material inside <source> tags. \
When <style> samples are present, write in the voice of their author but never mention their subject matter. \
Output only the answer.";

/// Assemble the chat request for one question.
pub fn build_prompt(
    style_samples: &[String],
    context: &str,
    question: &str,
    answer_length: AnswerLength,
) -> ChatRequest {
    let mut user = String::new();

    let samples: Vec<&str> = style_samples
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !samples.is_empty() {
        user.push_str("<style>\n");
        user.push_str(&samples.join("\n\n"));
        user.push_str("\n</style>\n\n");
    }

    user.push_str("<source>\n");
    user.push_str(context);
    user.push_str("\n</source>\n\n<question>\n");
    user.push_str(question.trim());
    user.push_str("\n</question>\n\n");
    user.push_str(&format!(
        "Do not exceed {} sentences for a {} answer. If the source does not contain enough information, say what is missing.",
        answer_length.max_sentences(),
        answer_length.as_str()
    ));

    ChatRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_tagged_sections() {
        let request = build_prompt(
            &["I write plainly.".to_string()],
            "chunk one\n\n---\n\nchunk two",
            " Why? ",
            AnswerLength::Long,
        );

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        let user = &request.messages[1].content;
        assert!(user.starts_with("<style>\nI write plainly.\n</style>"));
        assert!(user.contains("<source>\nchunk one\n\n---\n\nchunk two\n</source>"));
        assert!(user.contains("<question>\nWhy?\n</question>"));
        assert!(user.contains("10 sentences"));
    }

    #[test]
    fn blank_style_samples_are_omitted() {
        let request = build_prompt(&["  ".to_string()], "ctx", "q", AnswerLength::Short);

        let user = &request.messages[1].content;
        assert!(!user.contains("<style>"));
        assert!(user.starts_with("<source>"));
        assert!(user.contains("3 sentences"));
    }
}
