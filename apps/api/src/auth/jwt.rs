use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AuthError, CredentialVerifier};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id.
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 bearer tokens. Expiry is always checked, the issuer when configured.
pub struct JwtVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingCredentials)?;
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("jwt rejected: {e}");
            AuthError::InvalidToken
        })?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    const SECRET: &str = "test-secret";

    fn token(sub: &str, exp_offset_secs: i64, iss: Option<&str>, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (Utc::now().timestamp() + exp_offset_secs) as usize,
            iss: iss.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_valid_token_yields_subject() {
        let verifier = JwtVerifier::new(SECRET, None);
        let headers = bearer(&token("user-1", 3600, None, SECRET));
        assert_eq!(verifier.verify(&headers).await.unwrap(), "user-1");
    }

    #[tokio::test]
    async fn test_missing_header_is_missing_credentials() {
        let verifier = JwtVerifier::new(SECRET, None);
        assert_eq!(
            verifier.verify(&HeaderMap::new()).await,
            Err(AuthError::MissingCredentials)
        );
    }

    #[tokio::test]
    async fn test_user_id_header_is_not_trusted() {
        let verifier = JwtVerifier::new(SECRET, None);
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("user-1"));
        assert_eq!(
            verifier.verify(&headers).await,
            Err(AuthError::MissingCredentials)
        );
    }

    #[tokio::test]
    async fn test_rejects_expired_and_wrong_secret() {
        let verifier = JwtVerifier::new(SECRET, None);
        let expired = bearer(&token("user-1", -3600, None, SECRET));
        assert_eq!(verifier.verify(&expired).await, Err(AuthError::InvalidToken));

        let forged = bearer(&token("user-1", 3600, None, "other-secret"));
        assert_eq!(verifier.verify(&forged).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_issuer_checked_when_configured() {
        let verifier = JwtVerifier::new(SECRET, Some("jobboard"));
        let good = bearer(&token("user-1", 3600, Some("jobboard"), SECRET));
        assert_eq!(verifier.verify(&good).await.unwrap(), "user-1");

        let wrong = bearer(&token("user-1", 3600, Some("elsewhere"), SECRET));
        assert_eq!(verifier.verify(&wrong).await, Err(AuthError::InvalidToken));
    }
}
