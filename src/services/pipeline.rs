use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::{AppError, AppResult};

/// Header carrying the pipeline API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Opaque text-generating service behind the chat widget.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Run the pipeline for one user query and return its JSON payload as-is.
    async fn execute(&self, user_input: &str) -> AppResult<serde_json::Value>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineRequest<'a> {
    user_input: &'a str,
    async_output: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineClient {
    client: Client,
    url: String,
    api_key: String,
    timeout_seconds: u64,
}

impl PipelineClient {
    pub fn new(config: &PipelineConfig) -> AppResult<Self> {
        if config.url.trim().is_empty() {
            return Err(AppError::Config("pipeline URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Pipeline for PipelineClient {
    async fn execute(&self, user_input: &str) -> AppResult<serde_json::Value> {
        tracing::debug!("Executing pipeline ({} chars of input)", user_input.len());

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&PipelineRequest {
                user_input,
                async_output: false,
            })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Pipeline responded with {}: {}", status, body);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| self.classify(e))
    }
}

impl PipelineClient {
    fn classify(&self, error: reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::UpstreamTimeout(self.timeout_seconds)
        } else {
            AppError::Transport(error)
        }
    }
}

/// Text the chat widget shows for a pipeline payload: the `result` string
/// when present, otherwise the whole payload pretty-printed.
pub fn result_text(payload: &serde_json::Value) -> String {
    match payload.get("result") {
        Some(serde_json::Value::String(text)) if !text.is_empty() => text.clone(),
        _ => serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
    }
}
