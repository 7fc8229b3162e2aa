use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Role assigned to accounts created through self-service sign-up.
pub const DEFAULT_ROLE: &str = "USER";

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub company: Option<String>,
}
