//! User account entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered account that owns links.
///
/// Only hashes of the password and API key are kept.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub api_key_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub plan_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input data for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub api_key_hash: String,
    pub first_name: String,
    pub last_name: String,
}
