//! Link management for authenticated owners.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::{LinkListQuery, LinkRepository};
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, validate_custom_alias};
use crate::utils::destination::validate_destination;
use crate::utils::password::hash_password;
use crate::utils::qr::{qr_data_uri, qr_svg};

/// Collision retries for generated codes.
const MAX_CODE_ATTEMPTS: usize = 10;

/// Fields accepted when creating a link.
#[derive(Debug, Clone, Default)]
pub struct CreateLinkInput {
    pub original_url: String,
    pub custom_alias: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Service for creating and managing an owner's links.
///
/// Every operation except [`LinkService::create`] requires the caller to own
/// the link. A missing link is `NotFound`; someone else's link is `Forbidden`.
pub struct LinkService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    base_url: String,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    pub fn new(repository: Arc<L>, base_url: impl Into<String>) -> Self {
        Self {
            repository,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates a link for `owner_id`, or an anonymous one when `None`.
    ///
    /// # Code selection
    ///
    /// - A custom alias is validated and used verbatim; if taken the call fails
    /// - Otherwise a random code is generated, retrying up to 10 times on collision
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad destination, alias or past expiry
    /// - [`AppError::Conflict`] if the custom alias already exists
    pub async fn create(
        &self,
        owner_id: Option<Uuid>,
        input: CreateLinkInput,
    ) -> Result<ShortLink, AppError> {
        let original_url = validate_destination(&input.original_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        if let Some(expires_at) = input.expires_at {
            ensure_future(expires_at)?;
        }

        let password_hash = match input.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let custom_alias = input
            .custom_alias
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let mut new_link = NewShortLink {
            owner_id,
            original_url,
            short_code: String::new(),
            custom_alias: custom_alias.clone(),
            title: input.title,
            description: input.description,
            password_hash,
            expires_at: input.expires_at,
        };

        if let Some(alias) = custom_alias {
            validate_custom_alias(&alias)?;

            if self.repository.find_by_short_code(&alias).await?.is_some() {
                return Err(alias_taken(&alias));
            }

            new_link.short_code = alias.clone();
            return match self.repository.create(new_link).await {
                Err(AppError::Conflict { .. }) => Err(alias_taken(&alias)),
                other => other.inspect(|link| log_created(link)),
            };
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            new_link.short_code = generate_code()?;

            match self.repository.create(new_link.clone()).await {
                Ok(link) => {
                    log_created(&link);
                    return Ok(link);
                }
                Err(AppError::Conflict { .. }) => {
                    tracing::debug!(attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    pub async fn get(&self, owner_id: Uuid, url_id: Uuid) -> Result<ShortLink, AppError> {
        self.owned_link(owner_id, url_id).await
    }

    /// Returns one page of the owner's links and the total match count.
    pub async fn list(
        &self,
        owner_id: Uuid,
        query: LinkListQuery,
    ) -> Result<(Vec<ShortLink>, i64), AppError> {
        self.repository.list_by_owner(owner_id, query).await
    }

    /// Applies a partial update. An empty patch returns the link unchanged.
    pub async fn update(
        &self,
        owner_id: Uuid,
        url_id: Uuid,
        patch: ShortLinkPatch,
    ) -> Result<ShortLink, AppError> {
        let link = self.owned_link(owner_id, url_id).await?;

        if let Some(Some(expires_at)) = patch.expires_at {
            ensure_future(expires_at)?;
        }

        if patch.is_empty() {
            return Ok(link);
        }

        let updated = self.repository.update(url_id, patch).await?;
        tracing::info!(%url_id, "Link updated");
        Ok(updated)
    }

    /// Soft-deletes a link. Stored clicks are kept.
    pub async fn delete(&self, owner_id: Uuid, url_id: Uuid) -> Result<(), AppError> {
        self.owned_link(owner_id, url_id).await?;

        if !self.repository.soft_delete(url_id).await? {
            return Err(AppError::not_found(
                "URL not found",
                json!({ "url_id": url_id }),
            ));
        }

        tracing::info!(%url_id, "Link deleted");
        Ok(())
    }

    /// Renders the link's short URL as an SVG QR code data URI.
    pub async fn qr_code(&self, owner_id: Uuid, url_id: Uuid, size: u32) -> Result<String, AppError> {
        let link = self.owned_link(owner_id, url_id).await?;
        qr_data_uri(&self.short_url(&link.short_code), size)
    }

    /// Renders the QR code as a standalone SVG document for download.
    ///
    /// Returns the link alongside so callers can name the file after its code.
    pub async fn qr_svg(
        &self,
        owner_id: Uuid,
        url_id: Uuid,
        size: u32,
    ) -> Result<(ShortLink, String), AppError> {
        let link = self.owned_link(owner_id, url_id).await?;
        let svg = qr_svg(&self.short_url(&link.short_code), size)?;
        Ok((link, svg))
    }

    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }

    pub fn qr_download_url(&self, url_id: Uuid, size: u32) -> String {
        format!("{}/api/v1/urls/{url_id}/qr/download?size={size}", self.base_url)
    }

    async fn owned_link(&self, owner_id: Uuid, url_id: Uuid) -> Result<ShortLink, AppError> {
        let link = self
            .repository
            .find_by_id(url_id)
            .await?
            .ok_or_else(|| AppError::not_found("URL not found", json!({ "url_id": url_id })))?;

        if !link.is_owned_by(owner_id) {
            return Err(AppError::forbidden(
                "Access denied",
                json!({ "url_id": url_id }),
            ));
        }

        Ok(link)
    }
}

fn ensure_future(expires_at: DateTime<Utc>) -> Result<(), AppError> {
    if expires_at <= Utc::now() {
        return Err(AppError::bad_request(
            "Expiration date must be in the future",
            json!({ "expires_at": expires_at }),
        ));
    }
    Ok(())
}

fn alias_taken(alias: &str) -> AppError {
    AppError::conflict(
        "Custom alias already exists",
        json!({ "custom_alias": alias, "reason": "URL_CUSTOM_ALIAS_EXISTS" }),
    )
}

fn log_created(link: &ShortLink) {
    tracing::info!(url_id = %link.id, short_code = %link.short_code, "Link created");
}
