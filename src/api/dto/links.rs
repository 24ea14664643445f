//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::pagination::{PaginationMeta, PaginationParams};
use crate::application::services::CreateLinkInput;
use crate::domain::entities::{ShortLink, ShortLinkPatch};
use crate::domain::repositories::{LinkListQuery, LinkSortField, SortOrder};

static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("alias regex is valid"));

/// Request body for `POST /api/v1/urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub original_url: String,

    #[validate(length(min = 3, max = 32))]
    #[validate(regex(path = "*ALIAS_REGEX", message = "Alias may contain letters, digits, '-' and '_'"))]
    pub custom_alias: Option<String>,

    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateUrlRequest> for CreateLinkInput {
    fn from(req: CreateUrlRequest) -> Self {
        Self {
            original_url: req.original_url,
            custom_alias: req.custom_alias,
            title: req.title,
            description: req.description,
            password: req.password,
            expires_at: req.expires_at,
        }
    }
}

/// Request body for `PUT /api/v1/urls/{url_id}`.
///
/// Only provided fields change.
///
/// # `expires_at` semantics
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear expiry
/// - **Timestamp** → set new expiry
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUrlRequest {
    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,

    pub is_active: Option<bool>,
}

impl From<UpdateUrlRequest> for ShortLinkPatch {
    fn from(req: UpdateUrlRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            expires_at: req.expires_at,
            is_active: req.is_active,
        }
    }
}

/// Query string for `GET /api/v1/urls`.
#[derive(Debug, Default, Deserialize)]
pub struct ListUrlsParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    pub search: Option<String>,

    pub sort_by: Option<String>,

    pub order: Option<String>,
}

impl ListUrlsParams {
    pub fn to_query(&self) -> Result<LinkListQuery, String> {
        let (offset, limit) = self.pagination.offset_limit()?;

        let sort = self
            .sort_by
            .as_deref()
            .map(LinkSortField::parse)
            .unwrap_or_default();
        let order = self
            .order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();

        Ok(LinkListQuery::new(offset, limit)
            .with_search(self.search.clone())
            .with_sort(sort, order))
    }
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct QrParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub size: Option<u32>,
}

/// JSON representation of an owner's link.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub id: Uuid,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub custom_alias: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub password_protected: bool,
    pub is_active: bool,
    pub click_count: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_clicked_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

impl UrlResponse {
    pub fn new(link: ShortLink, short_url: String) -> Self {
        Self {
            id: link.id,
            password_protected: link.is_password_protected(),
            short_code: link.short_code,
            short_url,
            original_url: link.original_url,
            custom_alias: link.custom_alias,
            title: link.title,
            description: link.description,
            is_active: link.is_active,
            click_count: link.click_count,
            expires_at: link.expires_at,
            created_at: link.created_at,
            updated_at: link.updated_at,
            last_clicked_at: link.last_clicked_at,
            qr_code: None,
        }
    }

    pub fn with_qr_code(mut self, qr_code: Option<String>) -> Self {
        self.qr_code = qr_code;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct UrlListResponse {
    pub urls: Vec<UrlResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub url_id: Uuid,
    pub size: u32,
    pub format: &'static str,
    pub qr_code: String,
    pub download_url: String,
}
