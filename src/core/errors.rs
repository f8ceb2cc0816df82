use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::{response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("service unavailable")]
    ServiceUnavailable,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::ServiceUnavailable => "Service unavailable".to_string(),
            ApiError::TooManyRequests { .. } => {
                "Rate limit exceeded. Please wait before making another request.".to_string()
            }
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        if let ApiError::TooManyRequests { retry_after_secs } = self {
            let body = Json(json!({
                "error": message,
                "resetTime": reset_time_millis(retry_after_secs)
            }));
            let mut response = (status, body).into_response();
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from_static("0"),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-reset"),
                HeaderValue::from(retry_after_secs),
            );
            return response;
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Unix time in milliseconds at which a limited caller may retry.
fn reset_time_millis(retry_after_secs: u64) -> u64 {
    let at = SystemTime::now() + Duration::from_secs(retry_after_secs);
    at.duration_since(UNIX_EPOCH)
        .map(|since| u64::try_from(since.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
