//! Test doubles for the model gateway.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use super::{InferenceBackend, ModelError, ModelGateway};

/// Scripted backend that records every prompt it receives.
pub struct StubBackend {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for StubBackend {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(ModelError::Daemon)
    }
}

/// Writes `model-info.json` into `dir`, optionally creating the model artifact.
pub fn write_descriptor(dir: &Path, with_artifact: bool) -> PathBuf {
    let model_path = dir.join("model.gguf");
    if with_artifact {
        std::fs::write(&model_path, b"gguf").unwrap();
    }
    let descriptor = json!({
        "selectedModel": {
            "name": "Llama 3 8B",
            "repoId": "meta-llama/Meta-Llama-3-8B-Instruct",
            "filename": "model.gguf",
            "size": "4.7GB",
            "description": "General purpose instruct model"
        },
        "downloadDate": "2024-01-01T00:00:00.000Z",
        "modelPath": model_path,
    });
    let path = dir.join("model-info.json");
    std::fs::write(&path, descriptor.to_string()).unwrap();
    path
}

/// A gateway whose probe succeeded, backed by `backend`.
pub async fn ready_gateway(dir: &Path, backend: Arc<StubBackend>) -> ModelGateway {
    let path = write_descriptor(dir, true);
    ModelGateway::initialize(backend, &path).await
}

/// A gateway with no descriptor on disk.
pub async fn unconfigured_gateway(dir: &Path) -> ModelGateway {
    ModelGateway::initialize(
        Arc::new(StubBackend::replying("unused")),
        &dir.join("model-info.json"),
    )
    .await
}
