//! Typed settings read from the merged YAML configuration.
//!
//! Every field has a default, so a missing or partial `config.yml` still
//! yields a usable [`Settings`]. Range checks happen in
//! [`validate_config`](super::validation::validate_config) when the file is
//! written, not here.

use std::env;

use serde::Serialize;
use serde_json::Value;

use crate::rag::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS, DEFAULT_SEPARATOR};

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_LLM_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub retrieval: RetrievalSettings,
    pub rate_limit: RateLimitSettings,
    pub llm: LlmSettings,
    pub qa: QaSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalSettings {
    /// Words per chunk
    pub chunk_size: usize,
    /// Chunks handed to the model per question
    pub max_chunks: usize,
    /// Text placed between chunks in the prompt
    pub context_separator: String,
    /// Optional cap on the joined context, in characters
    pub max_context_length: Option<usize>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            context_separator: DEFAULT_SEPARATOR.to_string(),
            max_context_length: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub requests_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            max_tokens: 4000,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QaSettings {
    /// Maximum question length in characters
    pub max_question_length: usize,
    /// Maximum source document length in characters
    pub max_source_length: usize,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            max_question_length: 2_000,
            max_source_length: 500_000,
        }
    }
}

impl Settings {
    pub fn from_value(config: &Value) -> Self {
        let defaults = Settings::default();

        let server = ServerSettings {
            host: get_str(config, &["server", "host"]).unwrap_or(defaults.server.host),
            port: get_u64(config, &["server", "port"])
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(defaults.server.port),
            cors_allowed_origins: get_string_list(config, &["server", "cors_allowed_origins"]),
        };

        let retrieval = RetrievalSettings {
            chunk_size: get_usize(config, &["retrieval", "chunk_size"])
                .unwrap_or(defaults.retrieval.chunk_size),
            max_chunks: get_usize(config, &["retrieval", "max_chunks"])
                .unwrap_or(defaults.retrieval.max_chunks),
            context_separator: get_str(config, &["retrieval", "context_separator"])
                .unwrap_or(defaults.retrieval.context_separator),
            max_context_length: get_usize(config, &["retrieval", "max_context_length"]),
        };

        let rate_limit = RateLimitSettings {
            enabled: get(config, &["rate_limit", "enabled"])
                .and_then(Value::as_bool)
                .unwrap_or(defaults.rate_limit.enabled),
            requests_per_minute: get_u64(config, &["rate_limit", "requests_per_minute"])
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.rate_limit.requests_per_minute),
        };

        let llm = LlmSettings {
            base_url: get_str(config, &["llm", "base_url"]).unwrap_or(defaults.llm.base_url),
            model: get_str(config, &["llm", "model"]).unwrap_or(defaults.llm.model),
            api_key: get_str(config, &["llm", "api_key"]),
            max_tokens: get_u64(config, &["llm", "max_tokens"])
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.llm.max_tokens),
            temperature: get(config, &["llm", "temperature"])
                .and_then(Value::as_f64)
                .unwrap_or(defaults.llm.temperature),
            timeout_secs: get_u64(config, &["llm", "timeout_secs"])
                .unwrap_or(defaults.llm.timeout_secs),
        };

        let qa = QaSettings {
            max_question_length: get_usize(config, &["qa", "max_question_length"])
                .unwrap_or(defaults.qa.max_question_length),
            max_source_length: get_usize(config, &["qa", "max_source_length"])
                .unwrap_or(defaults.qa.max_source_length),
        };

        Settings {
            server,
            retrieval,
            rate_limit,
            llm,
            qa,
        }
    }

    /// Apply `PORT`, `PENMARK_LLM_API_KEY` and `ANTHROPIC_API_KEY`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }

        let env_key = env::var("PENMARK_LLM_API_KEY")
            .or_else(|_| env::var("ANTHROPIC_API_KEY"))
            .ok()
            .map(|key| clean_api_key(&key))
            .filter(|key| !key.is_empty());
        if env_key.is_some() {
            self.llm.api_key = env_key;
        }

        self
    }
}

/// Strip whitespace and stray line breaks pasted along with a key.
pub fn clean_api_key(raw: &str) -> String {
    raw.trim().replace(['\r', '\n'], "")
}

fn get<'a>(config: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(config, |current, key| current.get(*key))
}

fn get_str(config: &Value, path: &[&str]) -> Option<String> {
    get(config, path).and_then(Value::as_str).map(str::to_string)
}

fn get_u64(config: &Value, path: &[&str]) -> Option<u64> {
    get(config, path).and_then(Value::as_u64)
}

fn get_usize(config: &Value, path: &[&str]) -> Option<usize> {
    get_u64(config, path).and_then(|v| usize::try_from(v).ok())
}

fn get_string_list(config: &Value, path: &[&str]) -> Vec<String> {
    get(config, path)
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_uses_defaults() {
        let settings = Settings::from_value(&json!({}));

        assert_eq!(settings.retrieval.chunk_size, 500);
        assert_eq!(settings.retrieval.max_chunks, 3);
        assert_eq!(settings.retrieval.context_separator, "\n\n---\n\n");
        assert_eq!(settings.rate_limit.requests_per_minute, 10);
        assert!(settings.rate_limit.enabled);
        assert_eq!(settings.llm.max_tokens, 4000);
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn reads_nested_values() {
        let settings = Settings::from_value(&json!({
            "server": { "host": "0.0.0.0", "port": 8080, "cors_allowed_origins": [" http://app ", ""] },
            "retrieval": { "chunk_size": 200, "max_chunks": 5, "max_context_length": 9000 },
            "rate_limit": { "enabled": false, "requests_per_minute": 30 },
            "llm": { "model": "writer", "temperature": 0.2 }
        }));

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.cors_allowed_origins, vec!["http://app"]);
        assert_eq!(settings.retrieval.chunk_size, 200);
        assert_eq!(settings.retrieval.max_chunks, 5);
        assert_eq!(settings.retrieval.max_context_length, Some(9000));
        assert!(!settings.rate_limit.enabled);
        assert_eq!(settings.rate_limit.requests_per_minute, 30);
        assert_eq!(settings.llm.model, "writer");
        assert_eq!(settings.llm.temperature, 0.2);
    }

    #[test]
    fn out_of_range_port_falls_back() {
        let settings = Settings::from_value(&json!({ "server": { "port": 70000 } }));
        assert_eq!(settings.server.port, 0);
    }

    #[test]
    fn clean_api_key_strips_line_breaks() {
        assert_eq!(clean_api_key("  sk-ant-abc\r\n"), "sk-ant-abc");
        assert_eq!(clean_api_key("sk-ant-\nabc"), "sk-ant-abc");
    }
}
