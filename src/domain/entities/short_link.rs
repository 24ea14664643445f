//! Short link entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A shortened URL together with its access policy and click counters.
///
/// `owner_id` is `None` for anonymous links. A present `password_hash`
/// gates the redirect behind the unlock flow.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortLink {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub domain_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub click_count: i64,
    pub unique_click_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_clicked_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    /// Returns true if the link has an expiry that is not after `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Active and not expired. Password protection is checked separately.
    pub fn is_accessible(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == Some(user_id)
    }
}

/// Input data for creating a new short link.
///
/// `short_code` must already be chosen; the repository insert reserves it.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub owner_id: Option<Uuid>,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default)]
pub struct ShortLinkPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
}

impl ShortLinkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.expires_at.is_none()
            && self.is_active.is_none()
    }
}

#[cfg(test)]
pub(crate) fn sample_link() -> ShortLink {
    let now = Utc::now();
    ShortLink {
        id: Uuid::new_v4(),
        owner_id: Some(Uuid::new_v4()),
        original_url: "https://example.com/landing".to_string(),
        short_code: "abc123".to_string(),
        custom_alias: None,
        domain_id: None,
        title: Some("Landing".to_string()),
        description: None,
        password_hash: None,
        is_active: true,
        click_count: 0,
        unique_click_count: 0,
        expires_at: None,
        created_at: now,
        updated_at: now,
        last_clicked_at: None,
    }
}
