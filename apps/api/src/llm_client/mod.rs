//! LLM Client: the single point of entry for text generation in the assistant.
//!
//! All model calls go through the `TextGenerator` trait so the pipeline can be
//! driven by a fake in tests. `OllamaClient` is the production backend and talks
//! to a local Ollama server.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

/// Model used when `OLLAMA_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "mistral";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("generation timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An opaque text-completion service: one prompt in, raw text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Identifier shown in logs and responses.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Client for a local Ollama server's `/api/generate` endpoint (non-streaming).
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();

        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("Ollama returned {}: {}", status, body);
            return Err(LlmError::ServiceUnavailable(format!("status {status}: {body}")));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Ollama reports errors as {"error": "..."}
            let message = serde_json::from_str::<OllamaError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let generated: GenerateResponse = serde_json::from_str(&body)?;

        debug!(
            "Generation succeeded: model={}, prompt_tokens={:?}, output_tokens={:?}",
            self.model, generated.prompt_eval_count, generated.eval_count
        );

        // Blank replies are returned as-is; callers decide what an empty reply means.
        Ok(generated.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

impl OllamaClient {
    fn classify(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else if error.is_connect() {
            LlmError::ServiceUnavailable(format!("cannot reach {}: {error}", self.base_url))
        } else {
            LlmError::Http(error)
        }
    }
}

/// Runs one generation call with a caller-supplied upper bound.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Generation call to {} exceeded {}s",
                generator.model(),
                timeout.as_secs()
            );
            Err(LlmError::Timeout {
                secs: timeout.as_secs(),
            })
        }
    }
}
