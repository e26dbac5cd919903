//! Ollama model client — `/api/generate` over HTTP.
//!
//! Uses the non-chat generate endpoint because the orchestrator renders
//! the full conversation (system instructions + turns) into a single
//! prompt string itself; the model service only has to complete one turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use libreassistant_core::{ModelClient, ModelError, TurnRequest};

/// A client for a local or remote Ollama server.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for the given base URL (e.g., `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ModelError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn send_turn(&self, request: TurnRequest) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        };

        debug!(
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending turn to Ollama"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(format!("Ollama did not respond in time: {e}"))
                } else {
                    ModelError::Network(format!("failed to reach Ollama at {url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Ollama returned an error status");
            return Err(ModelError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("malformed generate response: {e}")))?;

        Ok(parsed.response)
    }

    async fn health_check(&self) -> Result<bool, ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => Err(ModelError::Network(format!(
                "health check failed for {url}: {e}"
            ))),
        }
    }
}
