use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::FieldError;

/// Raw text of a 5xx failure, attached as a response extension. The body
/// carries a generic message until [`reveal_error_detail`] swaps it in.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub error: &'static str,
    pub detail: String,
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders the `{success: false, error, message}` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Validation failure with a single free-form message (e.g. a malformed body).
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return AppError::Conflict("Resource already exists".to_string());
            }
        }
        AppError::Database(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut detail = None;

        let (status, error, message, field_errors) = match self {
            AppError::Validation { message, errors } => (
                StatusCode::BAD_REQUEST,
                "Validation Error",
                message,
                Some(errors),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", msg, None),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service Unavailable",
                msg,
                None,
            ),
            AppError::GenerationFailed(msg) => {
                tracing::error!("Generation failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Generation Failed",
                    msg,
                    None,
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                detail = Some(e.to_string());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database Error",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                detail = Some(format!("{e:#}"));
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "Something went wrong".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "success": false,
            "error": error,
            "message": message,
        });
        if let Some(errors) = field_errors.filter(|e| !e.is_empty()) {
            body["validationErrors"] = json!(errors);
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail { error, detail });
        }
        response
    }
}

/// When `expose` is set, replaces the generic 5xx message with the
/// underlying error text.
pub fn reveal_error_detail(expose: bool, response: Response) -> Response {
    if !expose {
        return response;
    }
    let Some(ErrorDetail { error, detail }) = response.extensions().get::<ErrorDetail>().cloned()
    else {
        return response;
    };

    let body = json!({
        "success": false,
        "error": error,
        "message": detail,
    });
    (response.status(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_renders_envelope() {
        let response = AppError::NotFound("Job application not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Job application not found");
    }

    #[tokio::test]
    async fn test_validation_includes_field_errors() {
        let err = AppError::Validation {
            message: "companyName: Company name is required".into(),
            errors: vec![FieldError::new("companyName", "Company name is required")],
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["validationErrors"][0]["field"], "companyName");
    }

    #[tokio::test]
    async fn test_service_unavailable_is_503() {
        let response = AppError::ServiceUnavailable("LLM not initialized".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail_by_default() {
        let response =
            AppError::Internal(anyhow::anyhow!("connection reset by peer")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let detail = response.extensions().get::<ErrorDetail>().cloned().unwrap();
        assert_eq!(detail.error, "Internal Server Error");
        assert_eq!(detail.detail, "connection reset by peer");

        let body = body_json(response).await;
        assert_eq!(body["message"], "Something went wrong");
    }

    #[tokio::test]
    async fn test_client_errors_carry_no_detail() {
        let response = AppError::BadRequest("Invalid status".into()).into_response();
        assert!(response.extensions().get::<ErrorDetail>().is_none());
    }
}
