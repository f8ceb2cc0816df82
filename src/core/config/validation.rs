use serde_json::{Map, Value};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(
            retrieval,
            "retrieval.chunk_size",
            "chunk_size",
            1,
            100_000,
        )?;
        validate_u64_field(retrieval, "retrieval.max_chunks", "max_chunks", 1, 100)?;
        validate_optional_string_field(
            retrieval,
            "retrieval.context_separator",
            "context_separator",
        )?;
        validate_u64_field(
            retrieval,
            "retrieval.max_context_length",
            "max_context_length",
            1,
            10_000_000,
        )?;
    }

    if let Some(rate_limit) = expect_optional_object(root, "rate_limit")? {
        validate_bool_field(rate_limit, "rate_limit.enabled", "enabled")?;
        validate_u64_field(
            rate_limit,
            "rate_limit.requests_per_minute",
            "requests_per_minute",
            1,
            100_000,
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.model", "model")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_u64_field(llm, "llm.max_tokens", "max_tokens", 1, 200_000)?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 1.0)?;
        validate_u64_field(llm, "llm.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(qa) = expect_optional_object(root, "qa")? {
        validate_u64_field(
            qa,
            "qa.max_question_length",
            "max_question_length",
            1,
            1_000_000,
        )?;
        validate_u64_field(
            qa,
            "qa.max_source_length",
            "max_source_length",
            1,
            100_000_000,
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn out_of_range<T: std::fmt::Display>(path: &str, min: T, max: T) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(result: Result<(), ApiError>) -> String {
        match result {
            Err(ApiError::BadRequest(msg)) => msg,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn accepts_complete_config() {
        let config = json!({
            "server": { "host": "127.0.0.1", "port": 8080, "cors_allowed_origins": ["http://localhost:5173"] },
            "retrieval": { "chunk_size": 500, "max_chunks": 3, "context_separator": "\n---\n" },
            "rate_limit": { "enabled": true, "requests_per_minute": 10 },
            "llm": { "model": "m", "max_tokens": 4000, "temperature": 0.7 },
            "qa": { "max_question_length": 2000 }
        });

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_non_object_root_and_sections() {
        assert!(message(validate_config(&json!([1, 2]))).contains("'root'"));
        assert!(message(validate_config(&json!({ "retrieval": 5 }))).contains("'retrieval'"));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let msg = message(validate_config(&json!({ "retrieval": { "chunk_size": 0 } })));
        assert!(msg.contains("retrieval.chunk_size"));
        assert!(msg.contains("between 1 and 100000"));
    }

    #[test]
    fn rejects_wrong_types() {
        let msg = message(validate_config(&json!({ "rate_limit": { "enabled": "yes" } })));
        assert!(msg.contains("expected boolean"));

        let msg = message(validate_config(&json!({ "llm": { "temperature": 1.5 } })));
        assert!(msg.contains("llm.temperature"));

        let msg = message(validate_config(
            &json!({ "server": { "cors_allowed_origins": ["ok", " "] } }),
        ));
        assert!(msg.contains("cors_allowed_origins[1]"));
    }
}
