use std::sync::Arc;
use std::time::Instant;

use crate::auth::CredentialVerifier;
use crate::config::Config;
use crate::model_gateway::ModelGateway;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub model: Arc<ModelGateway>,
    /// Installed from `AUTH_MODE`: JWT by default, header trust in demo mode.
    pub verifier: Arc<dyn CredentialVerifier>,
    pub config: Config,
    pub started_at: Instant,
}
