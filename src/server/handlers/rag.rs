use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::qa::{QaRequest, SelectRequest};
use crate::state::AppState;

pub async fn answer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<QaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_api_key(&headers, &state.session_token)?;
    let quota = state.limiter.check(&format!("rag_qa:{}", caller))?;

    let result = state.qa.answer(&payload).await?;
    tracing::info!("Answered question for {} using {} chunks", caller, result.chunks_used);

    let mut response = Json(json!({
        "success": true,
        "answer": result.answer,
        "question": result.question,
        "chunksUsed": result.chunks_used
    }))
    .into_response();
    if let Some(quota) = quota {
        quota.write_headers(response.headers_mut());
    }
    Ok(response)
}

pub async fn select(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SelectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = require_api_key(&headers, &state.session_token)?;
    let quota = state.limiter.check(&format!("rag_select:{}", caller))?;

    let report = state.qa.select(&payload)?;
    let mut response = Json(report).into_response();
    if let Some(quota) = quota {
        quota.write_headers(response.headers_mut());
    }
    Ok(response)
}
