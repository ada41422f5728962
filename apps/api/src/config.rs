use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Anything other than an explicit `APP_ENV=development` hides error details.
const DEFAULT_APP_ENV: &str = "production";

/// How callers prove who they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Signed bearer tokens. The default.
    Jwt,
    /// Trust the `X-User-ID` header as-is. Only for local demos.
    Demo,
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the service runs against the in-memory store.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub app_env: String,
    pub auth_mode: AuthMode,
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
    pub model_info_path: PathBuf,
    pub inference_url: String,
    pub inference_model: String,
    pub inference_timeout: Duration,
    pub frontend_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let auth_mode = parse_auth_mode(optional_env("AUTH_MODE").as_deref())?;
        let jwt_secret = optional_env("JWT_SECRET");
        if auth_mode == AuthMode::Jwt && jwt_secret.is_none() {
            bail!("Required environment variable 'JWT_SECRET' is not set (AUTH_MODE=jwt)");
        }

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            app_env: optional_env("APP_ENV").unwrap_or_else(|| DEFAULT_APP_ENV.to_string()),
            auth_mode,
            jwt_secret,
            jwt_issuer: optional_env("JWT_ISSUER"),
            model_info_path: optional_env("MODEL_INFO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("models/model-info.json")),
            inference_url: std::env::var("INFERENCE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            inference_model: std::env::var("INFERENCE_MODEL")
                .unwrap_or_else(|_| "llama3:latest".to_string()),
            inference_timeout: Duration::from_secs(
                std::env::var("INFERENCE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse::<u64>()
                    .context("INFERENCE_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            frontend_url: optional_env("FRONTEND_URL"),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    /// Origins allowed by CORS: the local frontend plus `FRONTEND_URL` if set.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ];
        if let Some(url) = &self.frontend_url {
            if !origins.contains(url) {
                origins.push(url.clone());
            }
        }
        origins
    }
}

#[cfg(test)]
impl Config {
    /// Demo auth, no database, no model on disk.
    pub fn for_tests() -> Self {
        Config {
            database_url: None,
            port: 0,
            rust_log: "info".to_string(),
            app_env: "test".to_string(),
            auth_mode: AuthMode::Demo,
            jwt_secret: None,
            jwt_issuer: None,
            model_info_path: PathBuf::from("models/model-info.json"),
            inference_url: "http://localhost:11434".to_string(),
            inference_model: "llama3:latest".to_string(),
            inference_timeout: Duration::from_secs(5),
            frontend_url: None,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_auth_mode(raw: Option<&str>) -> Result<AuthMode> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("jwt") => Ok(AuthMode::Jwt),
        Some("demo") => Ok(AuthMode::Demo),
        Some(other) => bail!("AUTH_MODE must be 'jwt' or 'demo', got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_defaults_to_jwt() {
        assert_eq!(parse_auth_mode(None).unwrap(), AuthMode::Jwt);
    }

    #[test]
    fn test_auth_mode_is_case_insensitive() {
        assert_eq!(parse_auth_mode(Some("DEMO")).unwrap(), AuthMode::Demo);
        assert_eq!(parse_auth_mode(Some(" jwt ")).unwrap(), AuthMode::Jwt);
    }

    #[test]
    fn test_auth_mode_rejects_unknown_values() {
        assert!(parse_auth_mode(Some("none")).is_err());
    }

    #[test]
    fn test_development_is_opt_in() {
        let config = Config {
            app_env: DEFAULT_APP_ENV.to_string(),
            ..Config::for_tests()
        };
        assert!(!config.is_development());

        let config = Config {
            app_env: "development".to_string(),
            ..Config::for_tests()
        };
        assert!(config.is_development());
    }
}
