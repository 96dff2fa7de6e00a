// src/llm/client.rs
// Streaming client for the Gemini generate-content endpoint.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::llm::payload::UpstreamPayload;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: Value },
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub fallback_model: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Configuration from the centralized CONFIG.
    pub fn from_env() -> Self {
        Self {
            base_url: CONFIG.gemini_base_url.clone(),
            api_key: CONFIG.gemini_api_key.clone(),
            model: CONFIG.model.clone(),
            fallback_model: CONFIG.fallback_model.clone(),
            timeout_secs: CONFIG.upstream_timeout,
        }
    }
}

pub struct GeminiClient {
    http: ReqwestClient,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        // Bound the connect and per-read waits, not the whole response: a
        // healthy stream may stay open far longer than the timeout.
        let http = ReqwestClient::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .read_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn default_model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, model
        )
    }

    /// POSTs the payload in streaming mode. A 404 on a non-fallback model
    /// is retried exactly once against the fallback model with the same
    /// payload; every other error status is handed back to the caller with
    /// its parsed body.
    pub async fn send(
        &self,
        model: &str,
        payload: &UpstreamPayload,
        api_key: Option<&str>,
    ) -> Result<Response, LlmError> {
        let key = api_key.unwrap_or(&self.config.api_key);
        let response = self.post_stream(model, payload, key).await?;

        if response.status() == StatusCode::NOT_FOUND && model != self.config.fallback_model {
            warn!(
                model,
                fallback = %self.config.fallback_model,
                "model rejected upstream, retrying with fallback"
            );
            let retry = self.post_stream(&self.config.fallback_model, payload, key).await?;
            return Self::surface_errors(retry).await;
        }
        Self::surface_errors(response).await
    }

    async fn post_stream(
        &self,
        model: &str,
        payload: &UpstreamPayload,
        api_key: &str,
    ) -> Result<Response, reqwest::Error> {
        self.http
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
    }

    async fn surface_errors(response: Response) -> Result<Response, LlmError> {
        let status = response.status();
        if status.as_u16() < 400 {
            debug!(status = status.as_u16(), "upstream stream opened");
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        Err(LlmError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}
