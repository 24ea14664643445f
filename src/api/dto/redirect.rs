//! DTOs for the public redirect surface (unlock, access, info).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::{LinkPreview, UnlockGrant};

#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub redirect_url: String,
    pub access_token: String,
}

impl From<UnlockGrant> for UnlockResponse {
    fn from(grant: UnlockGrant) -> Self {
        Self {
            redirect_url: grant.redirect_url,
            access_token: grant.access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccessParams {
    #[serde(default)]
    pub token: String,
}

/// Public link preview.
#[derive(Debug, Serialize)]
pub struct LinkInfoResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub password_protected: bool,
    pub is_safe: bool,
}

impl From<LinkPreview> for LinkInfoResponse {
    fn from(p: LinkPreview) -> Self {
        Self {
            short_code: p.short_code,
            short_url: p.short_url,
            original_url: p.original_url,
            domain: p.domain,
            title: p.title,
            description: p.description,
            click_count: p.click_count,
            created_at: p.created_at,
            password_protected: p.password_protected,
            is_safe: p.is_safe,
        }
    }
}
