//! Short code resolution, access policy and click scheduling.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::application::services::token_issuer::TokenIssuer;
use crate::domain::click_event::{ClickContext, ClickEvent};
use crate::domain::entities::ShortLink;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::destination::destination_domain;
use crate::utils::password::verify_password;

/// Result of a successful unlock.
#[derive(Debug, Clone)]
pub struct UnlockGrant {
    /// Confirmation URL that carries the token and completes the redirect.
    pub redirect_url: String,
    pub access_token: String,
}

/// Public, unauthenticated preview of a link.
///
/// Destination fields are withheld for password-protected links.
#[derive(Debug, Clone)]
pub struct LinkPreview {
    pub short_code: String,
    pub short_url: String,
    pub original_url: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub password_protected: bool,
    /// Placeholder classification. No malware or phishing check backs it yet.
    pub is_safe: bool,
}

/// Resolves short codes on the redirect hot path.
///
/// Resolution is read-only. Click recording is handed to the background worker
/// through a bounded channel and never awaited.
pub struct RedirectService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    tokens: Arc<TokenIssuer>,
    click_sender: mpsc::Sender<ClickEvent>,
    base_url: String,
}

impl<L: LinkRepository + ?Sized> RedirectService<L> {
    pub fn new(
        repository: Arc<L>,
        tokens: Arc<TokenIssuer>,
        click_sender: mpsc::Sender<ClickEvent>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            tokens,
            click_sender,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Applies the redirect policy to a short code.
    ///
    /// # Policy (in order)
    ///
    /// 1. Unknown code, inactive or expired link → [`AppError::NotFound`]
    /// 2. Password set → [`AppError::PasswordProtected`]
    pub async fn resolve(&self, short_code: &str) -> Result<ShortLink, AppError> {
        let link = self.accessible_link(short_code).await?;

        if link.is_password_protected() {
            return Err(AppError::password_protected(
                "This URL is password protected",
                json!({ "short_code": short_code, "unlock_url": self.unlock_url(short_code) }),
            ));
        }

        Ok(link)
    }

    /// Resolves a short code and schedules exactly one click.
    ///
    /// Returns the destination URL. Failure paths schedule nothing.
    pub async fn process_redirect(
        &self,
        short_code: &str,
        context: ClickContext,
    ) -> Result<String, AppError> {
        let link = self.resolve(short_code).await?;

        self.schedule_click(link.id, context);
        counter!("redirects_total").increment(1);

        Ok(link.original_url)
    }

    /// Checks a password and issues a short-lived unlock token for that link only.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] for unknown, inactive, expired or unprotected links
    /// - [`AppError::InvalidPassword`] on mismatch
    pub async fn unlock(&self, short_code: &str, password: &str) -> Result<UnlockGrant, AppError> {
        let link = self.accessible_link(short_code).await?;

        let Some(password_hash) = link.password_hash.as_deref() else {
            return Err(AppError::not_found(
                "URL not found or not password protected",
                json!({ "short_code": short_code, "reason": "NOT_PROTECTED" }),
            ));
        };

        if !verify_password(password, password_hash) {
            tracing::info!(short_code, "Unlock attempt with wrong password");
            return Err(AppError::invalid_password(
                "Invalid password",
                json!({ "short_code": short_code }),
            ));
        }

        let access_token = self.tokens.issue_unlock(link.id)?;
        let redirect_url = format!(
            "{}/{}/access?token={}",
            self.base_url, link.short_code, access_token
        );

        Ok(UnlockGrant {
            redirect_url,
            access_token,
        })
    }

    /// Completes an unlock: validates the token against the link and redirects.
    ///
    /// Schedules one click like a normal redirect.
    pub async fn confirm_unlock(
        &self,
        short_code: &str,
        token: &str,
        context: ClickContext,
    ) -> Result<String, AppError> {
        let link = self.accessible_link(short_code).await?;

        self.tokens.verify_unlock(token, link.id)?;

        self.schedule_click(link.id, context);
        counter!("redirects_total").increment(1);

        Ok(link.original_url)
    }

    /// Builds the public preview. Never counts as a click.
    pub async fn public_info(&self, short_code: &str) -> Result<LinkPreview, AppError> {
        let link = self.accessible_link(short_code).await?;
        let password_protected = link.is_password_protected();

        let (original_url, domain) = if password_protected {
            (None, None)
        } else {
            let domain = destination_domain(&link.original_url);
            (Some(link.original_url), Some(domain))
        };

        Ok(LinkPreview {
            short_url: self.short_url(&link.short_code),
            short_code: link.short_code,
            original_url,
            domain,
            title: link.title,
            description: link.description,
            click_count: link.click_count,
            created_at: link.created_at,
            password_protected,
            is_safe: true,
        })
    }

    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }

    fn unlock_url(&self, short_code: &str) -> String {
        format!("{}/{}/unlock", self.base_url, short_code)
    }

    /// Unknown, inactive and expired links all collapse to the same `NotFound`.
    async fn accessible_link(&self, short_code: &str) -> Result<ShortLink, AppError> {
        let not_found = || AppError::not_found("URL not found", json!({ "short_code": short_code }));

        let link = self
            .repository
            .find_by_short_code(short_code)
            .await?
            .ok_or_else(not_found)?;

        if !link.is_accessible() {
            return Err(not_found());
        }

        Ok(link)
    }

    fn schedule_click(&self, url_id: Uuid, context: ClickContext) {
        match self.click_sender.try_send(ClickEvent::new(url_id, context)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(%url_id, "Click queue full, dropping click");
                counter!("clicks_dropped_total").increment(1);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(%url_id, "Click queue closed, dropping click");
                counter!("clicks_dropped_total").increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::token_issuer::test_issuer;
    use crate::domain::entities::sample_link;
    use crate::domain::repositories::MockLinkRepository;
    use crate::utils::password::hash_password;
    use chrono::Duration;

    fn service_with(
        link: Option<ShortLink>,
    ) -> (RedirectService<MockLinkRepository>, mpsc::Receiver<ClickEvent>) {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_short_code()
            .returning(move |_| Ok(link.clone()));

        let (tx, rx) = mpsc::channel(8);
        let service = RedirectService::new(
            Arc::new(repo),
            Arc::new(test_issuer()),
            tx,
            "https://sho.rt/",
        );

        (service, rx)
    }

    fn context() -> ClickContext {
        ClickContext::new(Some("203.0.113.1".to_string()), Some("curl/8.0"), None)
    }

    #[tokio::test]
    async fn test_redirect_schedules_one_click() {
        let link = sample_link();
        let link_id = link.id;
        let (service, mut rx) = service_with(Some(link));

        let url = service.process_redirect("abc123", context()).await.unwrap();

        assert_eq!(url, "https://example.com/landing");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.url_id, link_id);
        assert_eq!(event.ip.as_deref(), Some("203.0.113.1"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found_and_schedules_nothing() {
        let (service, mut rx) = service_with(None);

        let result = service.process_redirect("missing", context()).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_inactive_link_is_not_found_regardless_of_password_or_expiry() {
        let mut link = sample_link();
        link.is_active = false;
        link.password_hash = Some(hash_password("pw").unwrap());
        link.expires_at = Some(Utc::now() + Duration::days(1));
        let (service, mut rx) = service_with(Some(link));

        let result = service.process_redirect("abc123", context()).await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_expired_link_is_not_found() {
        let mut link = sample_link();
        link.expires_at = Some(Utc::now() - Duration::minutes(1));
        let (service, _rx) = service_with(Some(link));

        let result = service.resolve("abc123").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_password_protected_is_distinct_from_not_found() {
        let mut link = sample_link();
        link.password_hash = Some(hash_password("pw").unwrap());
        let (service, mut rx) = service_with(Some(link));

        let result = service.process_redirect("abc123", context()).await;

        assert!(matches!(result, Err(AppError::PasswordProtected { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unlock_wrong_password() {
        let mut link = sample_link();
        link.password_hash = Some(hash_password("right").unwrap());
        let (service, _rx) = service_with(Some(link));

        let result = service.unlock("abc123", "wrong").await;

        assert!(matches!(result, Err(AppError::InvalidPassword { .. })));
    }

    #[tokio::test]
    async fn test_unlock_then_confirm() {
        let mut link = sample_link();
        link.password_hash = Some(hash_password("right").unwrap());
        let link_id = link.id;
        let (service, mut rx) = service_with(Some(link));

        let grant = service.unlock("abc123", "right").await.unwrap();

        assert!(
            grant
                .redirect_url
                .starts_with("https://sho.rt/abc123/access?token=")
        );
        assert!(rx.try_recv().is_err());

        let url = service
            .confirm_unlock("abc123", &grant.access_token, context())
            .await
            .unwrap();

        assert_eq!(url, "https://example.com/landing");
        assert_eq!(rx.try_recv().unwrap().url_id, link_id);
    }

    #[tokio::test]
    async fn test_confirm_rejects_bad_token() {
        let mut link = sample_link();
        link.password_hash = Some(hash_password("right").unwrap());
        let (service, mut rx) = service_with(Some(link));

        let result = service
            .confirm_unlock("abc123", "garbage", context())
            .await;

        assert!(matches!(result, Err(AppError::InvalidToken { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unlock_unprotected_link_is_not_found() {
        let (service, _rx) = service_with(Some(sample_link()));

        let result = service.unlock("abc123", "anything").await;

        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_public_info_does_not_count_click() {
        let (service, mut rx) = service_with(Some(sample_link()));

        let preview = service.public_info("abc123").await.unwrap();

        assert_eq!(preview.short_url, "https://sho.rt/abc123");
        assert_eq!(preview.domain.as_deref(), Some("example.com"));
        assert!(preview.is_safe);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_public_info_hides_protected_destination() {
        let mut link = sample_link();
        link.password_hash = Some(hash_password("pw").unwrap());
        let (service, _rx) = service_with(Some(link));

        let preview = service.public_info("abc123").await.unwrap();

        assert!(preview.password_protected);
        assert!(preview.original_url.is_none());
        assert!(preview.domain.is_none());
    }

    #[tokio::test]
    async fn test_full_queue_drops_click_but_redirects() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_short_code()
            .returning(|_| Ok(Some(sample_link())));

        let (tx, _rx) = mpsc::channel(1);
        let service = RedirectService::new(Arc::new(repo), Arc::new(test_issuer()), tx, "https://sho.rt");

        assert!(service.process_redirect("abc123", context()).await.is_ok());
        assert!(service.process_redirect("abc123", context()).await.is_ok());
    }
}
