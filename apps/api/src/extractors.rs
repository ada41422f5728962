use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::AppError;

/// A `Json<T>` wrapper that turns body rejections into the JSON error envelope
/// instead of axum's plain-text response.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        Ok(AppJson(value))
    }
}

/// Like [`AppJson`], but a missing or blank body yields `T::default()`.
pub struct JsonOrDefault<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrDefault<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonOrDefault(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(JsonOrDefault)
            .map_err(|e| AppError::validation(format!("Failed to parse the request body as JSON: {e}")))
    }
}

/// Path ids that are not UUIDs cannot name a stored record.
pub fn record_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(not_found.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::header::CONTENT_TYPE};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Payload {
        name: String,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_deserializes() {
        let AppJson(payload) = AppJson::<Payload>::from_request(request(r#"{"name":"x"}"#), &())
            .await
            .unwrap();
        assert_eq!(payload.name, "x");
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let err = AppJson::<Payload>::from_request(request("{not json"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_blank_body_falls_back_to_default() {
        let JsonOrDefault(payload) = JsonOrDefault::<Payload>::from_request(request(""), &())
            .await
            .unwrap();
        assert_eq!(payload.name, "");

        let JsonOrDefault(payload) =
            JsonOrDefault::<Payload>::from_request(request(r#"{"name":"y"}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "y");

        let err = JsonOrDefault::<Payload>::from_request(request("[1"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_record_id_rejects_non_uuid_as_not_found() {
        let id = Uuid::new_v4();
        assert_eq!(record_id(&id.to_string(), "gone").unwrap(), id);
        assert!(matches!(record_id("42", "gone"), Err(AppError::NotFound(m)) if m == "gone"));
    }
}
