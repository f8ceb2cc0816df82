use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

pub async fn get_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, &state.session_token)?;
    Ok(Json(redacted_config(&state)?))
}

/// Replace the whole configuration.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    save(&state, &headers, payload, false)
}

/// Merge the payload into the current configuration.
pub async fn patch_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    save(&state, &headers, payload, true)
}

fn save(
    state: &AppState,
    headers: &HeaderMap,
    payload: Value,
    merge: bool,
) -> Result<Json<Value>, ApiError> {
    let caller = require_api_key(headers, &state.session_token)?;
    state.config.update_config(payload, merge)?;
    tracing::info!("Configuration saved by {}", caller);

    Ok(Json(json!({
        "status": "success",
        "config": redacted_config(state)?
    })))
}

fn redacted_config(state: &AppState) -> Result<Value, ApiError> {
    let config = state.config.load_config()?;
    Ok(state.config.redact_sensitive_values(&config))
}
