mod applications;
mod auth;
mod config;
mod errors;
mod extractors;
mod generation;
mod model_gateway;
mod models;
mod resumes;
mod routes;
mod state;
mod store;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{CredentialVerifier, HeaderTrustVerifier, JwtVerifier};
use crate::config::{AuthMode, Config};
use crate::model_gateway::{ModelGateway, OllamaClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{postgres::create_pool, MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{crate_name}={level},tower_http={level}",
                crate_name = env!("CARGO_CRATE_NAME"),
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board API v{}", env!("CARGO_PKG_VERSION"));

    // Persistence
    let (store, pool): (Arc<dyn Store>, Option<PgPool>) = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            (Arc::new(PgStore::new(pool.clone())), Some(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            (Arc::new(MemoryStore::new()), None)
        }
    };

    // Model gateway: descriptor load plus one connectivity probe
    let backend = OllamaClient::new(
        &config.inference_url,
        &config.inference_model,
        config.inference_timeout,
    )
    .context("Failed to build inference HTTP client")?;
    let model = Arc::new(ModelGateway::initialize(Arc::new(backend), &config.model_info_path).await);

    let verifier: Arc<dyn CredentialVerifier> = match config.auth_mode {
        AuthMode::Jwt => {
            let secret = config
                .jwt_secret
                .as_deref()
                .context("JWT_SECRET is required when AUTH_MODE=jwt")?;
            info!("Authentication: JWT bearer tokens");
            Arc::new(JwtVerifier::new(secret, config.jwt_issuer.as_deref()))
        }
        AuthMode::Demo => {
            warn!("AUTH_MODE=demo: trusting X-User-ID without verification");
            Arc::new(HeaderTrustVerifier)
        }
    };

    let state = AppState {
        store,
        model: model.clone(),
        verifier,
        config: config.clone(),
        started_at: Instant::now(),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    model.shutdown();
    if let Some(pool) = pool {
        pool.close().await;
        info!("Database pool closed");
    }
    info!("Server stopped");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
