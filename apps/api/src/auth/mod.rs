//! Caller identity. Handlers never read identity headers directly; they take
//! an [`AuthUser`] whose owner id came from the configured
//! [`CredentialVerifier`].

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::errors::AppError;

pub mod extractors;
pub mod jwt;

pub use extractors::AuthUser;
pub use jwt::JwtVerifier;

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("User ID is required")]
    MissingCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

/// Maps the credential presented on a request to a verified owner id.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, headers: &HeaderMap) -> Result<String, AuthError>;
}

/// Trusts whatever `X-User-ID` says. Only installed when `AUTH_MODE=demo`.
pub struct HeaderTrustVerifier;

#[async_trait]
impl CredentialVerifier for HeaderTrustVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[tokio::test]
    async fn test_header_trust_reads_user_id() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" user-42 "));
        assert_eq!(HeaderTrustVerifier.verify(&headers).await.unwrap(), "user-42");
    }

    #[tokio::test]
    async fn test_header_trust_rejects_missing_or_blank() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            HeaderTrustVerifier.verify(&headers).await,
            Err(AuthError::MissingCredentials)
        );
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert_eq!(
            HeaderTrustVerifier.verify(&headers).await,
            Err(AuthError::MissingCredentials)
        );
    }
}
