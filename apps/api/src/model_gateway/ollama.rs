//! Client for an Ollama-compatible `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{InferenceBackend, ModelError, TEMPERATURE, TOP_P};

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
    top_p: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    /// One non-streaming request. The daemon's `error` field wins over the
    /// HTTP status.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                num_predict: max_tokens,
            },
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed = match serde_json::from_str::<GenerateResponse>(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(ModelError::Parse(e)),
            Err(_) => {
                warn!("Inference daemon returned {status}: {text}");
                return Err(ModelError::Api {
                    status: status.as_u16(),
                    message: text,
                });
            }
        };

        if let Some(error) = parsed.error {
            return Err(ModelError::Daemon(error));
        }

        let content = parsed.response.ok_or(ModelError::EmptyContent)?;
        debug!("Inference call succeeded: {} chars", content.len());
        Ok(content)
    }
}
