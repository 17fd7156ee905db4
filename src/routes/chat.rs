use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::reconcile::{color_for, markdown::render_display, parse_response};
use crate::services::pipeline::{result_text, Pipeline};
use crate::AppState;

/// Longest query forwarded to the pipeline, in characters.
pub const MAX_INPUT_CHARS: usize = 2000;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(chat))
        .route("/preview", post(preview))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "userInput", default)]
    pub user_input: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidateView {
    pub index: usize,
    pub title: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub color: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub display: String,
    pub html: String,
    pub candidates: Vec<CandidateView>,
}

fn validated_input(request: &ChatRequest) -> AppResult<&str> {
    let input = request.user_input.as_deref().map(str::trim).unwrap_or("");
    if input.is_empty() {
        return Err(AppError::BadRequest("userInput is required".to_string()));
    }
    if input.chars().count() > MAX_INPUT_CHARS {
        return Err(AppError::Validation(format!(
            "userInput must be at most {} characters",
            MAX_INPUT_CHARS
        )));
    }
    Ok(input)
}

/// Forward a query to the pipeline and return its payload verbatim.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let input = validated_input(&request)?;
    let payload = state.pipeline.execute(input).await?;
    Ok(Json(payload))
}

/// Forward a query and return the reconciled view of the answer: display
/// text, its HTML rendering, and the candidate events with their colors.
async fn preview(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<PreviewResponse>, crate::error::AppErrorWithDetails> {
    let input = validated_input(&request)
        .map_err(|e| e.with_details(json!({ "field": "userInput" })))?;
    let payload = state.pipeline.execute(input).await?;

    let parsed = parse_response(&result_text(&payload));
    let html = render_display(&parsed.display);
    let candidates = parsed
        .candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| CandidateView {
            index,
            title: candidate.title,
            start: candidate.start,
            end: candidate.end,
            color: color_for(index),
        })
        .collect();

    Ok(Json(PreviewResponse {
        display: parsed.display,
        html,
        candidates,
    }))
}
