//! Model gateway: the single point of entry for calls to the local inference
//! daemon.
//!
//! The gateway is constructed once at startup from a model descriptor file and
//! an [`InferenceBackend`], probed once for connectivity, and handed to route
//! handlers through `AppState`. It never panics past this boundary: every
//! failure comes back as a [`ModelError`] the caller maps to an HTTP status.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub mod ollama;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub use ollama::OllamaClient;

/// Output budget for a full resume rewrite.
pub const GENERATION_MAX_TOKENS: u32 = 1500;
/// Output budget for the startup connectivity probe.
pub const PROBE_MAX_TOKENS: u32 = 50;
pub const TEMPERATURE: f32 = 0.7;
pub const TOP_P: f32 = 0.9;

const PROBE_PROMPT: &str = "Hello, respond with 'Test successful'";

pub const MSG_MODEL_MISSING: &str = "Model file not found. Please download the model.";
pub const MSG_NOT_INITIALIZED: &str = "LLM not initialized";
pub const MSG_READY: &str = "LLM is ready for use";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("LLM not available. Please set up the model first")]
    Unavailable,

    #[error("Failed to connect to inference daemon: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Inference daemon returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse inference response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Daemon(String),

    #[error("No content generated")]
    EmptyContent,
}

/// Text completion against a concrete inference daemon.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedModel {
    pub name: String,
    pub repo_id: String,
    pub filename: String,
    pub size: String,
    pub description: String,
}

/// Persisted description of the downloaded model, written by the setup tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub selected_model: SelectedModel,
    pub download_date: String,
    pub model_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub available: bool,
    pub model_info: Option<ModelDescriptor>,
    pub message: String,
}

/// Job context and base resume text for one rewrite.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub base_resume: String,
    pub job_title: String,
    pub company_name: String,
    pub job_description: Option<String>,
    pub custom_requirements: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub content: String,
    pub customizations: String,
}

pub struct ModelGateway {
    backend: Arc<dyn InferenceBackend>,
    descriptor: Option<ModelDescriptor>,
    ready: AtomicBool,
}

impl ModelGateway {
    /// Loads the descriptor and, if the model artifact is on disk, probes the
    /// daemon once. A missing descriptor or artifact skips the network call.
    pub async fn initialize(backend: Arc<dyn InferenceBackend>, descriptor_path: &Path) -> Self {
        let descriptor = load_descriptor(descriptor_path).await;

        let mut ready = false;
        if let Some(descriptor) = &descriptor {
            if artifact_exists(&descriptor.model_path).await {
                info!("Model descriptor loaded: {}", descriptor.selected_model.name);
                match backend.complete(PROBE_PROMPT, PROBE_MAX_TOKENS).await {
                    Ok(_) => {
                        info!("Inference daemon reachable, model gateway ready");
                        ready = true;
                    }
                    Err(e) => warn!("Inference probe failed, using fallback generation: {e}"),
                }
            } else {
                warn!(
                    "Model descriptor found but artifact missing at {}",
                    descriptor.model_path.display()
                );
            }
        }

        Self {
            backend,
            descriptor,
            ready: AtomicBool::new(ready),
        }
    }

    /// Re-checks the model artifact on every call; the probe result is cached.
    pub async fn status(&self) -> ModelStatus {
        let Some(descriptor) = &self.descriptor else {
            return ModelStatus {
                available: false,
                model_info: None,
                message: MSG_MODEL_MISSING.to_string(),
            };
        };

        if !artifact_exists(&descriptor.model_path).await {
            return ModelStatus {
                available: false,
                model_info: Some(descriptor.clone()),
                message: MSG_MODEL_MISSING.to_string(),
            };
        }

        let available = self.ready.load(Ordering::Acquire);
        ModelStatus {
            available,
            model_info: Some(descriptor.clone()),
            message: if available { MSG_READY } else { MSG_NOT_INITIALIZED }.to_string(),
        }
    }

    pub async fn is_available(&self) -> bool {
        self.status().await.available
    }

    /// Rewrites a resume for one job. The model output is returned trimmed.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ModelError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(ModelError::Unavailable);
        }

        info!(
            "Generating customized resume for {} at {}",
            request.job_title, request.company_name
        );

        let prompt = prompts::resume_prompt(request);
        let content = self.backend.complete(&prompt, GENERATION_MAX_TOKENS).await?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ModelError::EmptyContent);
        }

        Ok(Generation {
            content: content.to_string(),
            customizations: format!(
                "AI-enhanced resume for {} at {}",
                request.job_title, request.company_name
            ),
        })
    }

    /// Raw completion for callers that build their own prompt.
    pub async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ModelError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(ModelError::Unavailable);
        }
        self.backend.complete(prompt, max_tokens).await
    }

    /// Marks the gateway unavailable; called once the server has stopped.
    pub fn shutdown(&self) {
        if self.ready.swap(false, Ordering::AcqRel) {
            info!("Model gateway shut down");
        }
    }
}

async fn load_descriptor(path: &Path) -> Option<ModelDescriptor> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No model configuration found at {}", path.display());
            return None;
        }
        Err(e) => {
            warn!("Failed to read model descriptor {}: {e}", path.display());
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            warn!("Invalid model descriptor {}: {e}", path.display());
            None
        }
    }
}

async fn artifact_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::testing::{write_descriptor, StubBackend};
    use super::*;

    #[tokio::test]
    async fn test_missing_descriptor_is_unavailable_without_probe() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(StubBackend::replying("Test successful"));
        let gateway =
            ModelGateway::initialize(backend.clone(), &dir.path().join("model-info.json")).await;

        let status = gateway.status().await;
        assert!(!status.available);
        assert!(status.model_info.is_none());
        assert_eq!(status.message, MSG_MODEL_MISSING);
        assert!(backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_artifact_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(dir.path(), false);
        let backend = Arc::new(StubBackend::replying("Test successful"));
        let gateway = ModelGateway::initialize(backend.clone(), &path).await;

        let status = gateway.status().await;
        assert!(!status.available);
        assert!(status.model_info.is_some());
        assert_eq!(status.message, MSG_MODEL_MISSING);
        assert!(backend.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_failed_probe_reports_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(dir.path(), true);
        let backend = Arc::new(StubBackend::failing("connection refused"));
        let gateway = ModelGateway::initialize(backend.clone(), &path).await;

        let status = gateway.status().await;
        assert!(!status.available);
        assert_eq!(status.message, MSG_NOT_INITIALIZED);
        assert_eq!(backend.prompts(), vec![PROBE_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn test_successful_probe_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(dir.path(), true);
        let gateway =
            ModelGateway::initialize(Arc::new(StubBackend::replying("Test successful")), &path)
                .await;

        let status = gateway.status().await;
        assert!(status.available);
        assert_eq!(status.message, MSG_READY);
        assert_eq!(status.model_info.unwrap().selected_model.name, "Llama 3 8B");
    }

    #[tokio::test]
    async fn test_artifact_removed_after_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(dir.path(), true);
        let gateway =
            ModelGateway::initialize(Arc::new(StubBackend::replying("ok")), &path).await;
        assert!(gateway.is_available().await);

        std::fs::remove_file(dir.path().join("model.gguf")).unwrap();
        let status = gateway.status().await;
        assert!(!status.available);
        assert_eq!(status.message, MSG_MODEL_MISSING);
    }

    #[tokio::test]
    async fn test_generate_trims_and_tags_customizations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(dir.path(), true);
        let backend = Arc::new(StubBackend::replying("\n  Jane Doe\nRust Engineer  \n"));
        let gateway = ModelGateway::initialize(backend.clone(), &path).await;

        let request = GenerationRequest {
            base_resume: "Jane Doe\nSupport Specialist".to_string(),
            job_title: "Engineer".to_string(),
            company_name: "Acme".to_string(),
            ..Default::default()
        };
        let generation = gateway.generate(&request).await.unwrap();

        assert_eq!(generation.content, "Jane Doe\nRust Engineer");
        assert_eq!(generation.customizations, "AI-enhanced resume for Engineer at Acme");
        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Jane Doe\nSupport Specialist"));
    }

    #[tokio::test]
    async fn test_generate_when_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = ModelGateway::initialize(
            Arc::new(StubBackend::replying("ok")),
            &dir.path().join("missing.json"),
        )
        .await;

        let err = gateway.generate(&GenerationRequest::default()).await.unwrap_err();
        assert!(matches!(err, ModelError::Unavailable));
    }

    #[tokio::test]
    async fn test_generate_empty_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(dir.path(), true);
        let gateway =
            ModelGateway::initialize(Arc::new(StubBackend::replying("   ")), &path).await;
        // The probe accepts any reply, including whitespace.
        assert!(gateway.is_available().await);

        let err = gateway.generate(&GenerationRequest::default()).await.unwrap_err();
        assert!(matches!(err, ModelError::EmptyContent));
    }

    #[tokio::test]
    async fn test_shutdown_marks_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_descriptor(dir.path(), true);
        let gateway =
            ModelGateway::initialize(Arc::new(StubBackend::replying("ok")), &path).await;

        gateway.shutdown();
        assert!(!gateway.is_available().await);
        assert!(matches!(
            gateway.complete("hi", 10).await,
            Err(ModelError::Unavailable)
        ));
    }

    #[test]
    fn test_descriptor_json_shape() {
        let raw = r#"{
            "selectedModel": {
                "name": "Phi-3 Mini",
                "repoId": "microsoft/Phi-3-mini-4k-instruct-gguf",
                "filename": "Phi-3-mini-4k-instruct-q4.gguf",
                "size": "2.2GB",
                "description": "Small instruct model"
            },
            "downloadDate": "2024-05-01T10:00:00.000Z",
            "modelPath": "/models/Phi-3-mini-4k-instruct-q4.gguf"
        }"#;
        let descriptor: ModelDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(descriptor.selected_model.repo_id, "microsoft/Phi-3-mini-4k-instruct-gguf");

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["selectedModel"]["filename"], "Phi-3-mini-4k-instruct-q4.gguf");
        assert_eq!(value["downloadDate"], "2024-05-01T10:00:00.000Z");
    }
}
