use axum::{
    extract::State,
    http::{header, HeaderMap, Uri},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "environment": state.config.app_env,
    }))
}

/// GET /api/test
///
/// Echoes the caller's origin and user agent; handy when debugging CORS.
pub async fn test_handler(headers: HeaderMap) -> Json<Value> {
    let header_str = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
    Json(json!({
        "message": "API is working!",
        "timestamp": Utc::now(),
        "origin": header_str(header::ORIGIN),
        "userAgent": header_str(header::USER_AGENT),
    }))
}

pub async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}
