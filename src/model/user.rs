use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::role::Role;

#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: u64,
    /// Always stored trimmed and lower-cased.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
