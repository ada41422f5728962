use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Owner of every other record. The id is whatever the credential verifier
/// resolved, so it is free-form text rather than a UUID.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Placeholder identity for an owner seen for the first time.
    pub fn placeholder(id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            email: format!("user-{id}@example.com"),
            name: Some(format!("User {id}")),
            created_at: now,
            updated_at: now,
        }
    }
}
