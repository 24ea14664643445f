//! Repository trait for short link data access.

use crate::domain::entities::{DashboardSummary, NewShortLink, ShortLink, ShortLinkPatch};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Column a link listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkSortField {
    #[default]
    CreatedAt,
    ClickCount,
    Title,
}

impl LinkSortField {
    /// Parses a user-supplied sort key. Unknown keys fall back to creation time.
    pub fn parse(value: &str) -> Self {
        match value {
            "click_count" => LinkSortField::ClickCount,
            "title" => LinkSortField::Title,
            _ => LinkSortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            LinkSortField::CreatedAt => "created_at",
            LinkSortField::ClickCount => "click_count",
            LinkSortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter and pagination for an owner's link listing.
#[derive(Debug, Clone)]
pub struct LinkListQuery {
    pub offset: i64,
    pub limit: i64,
    /// Case-insensitive substring match on title, original URL and short code.
    pub search: Option<String>,
    pub sort: LinkSortField,
    pub order: SortOrder,
}

impl LinkListQuery {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            search: None,
            sort: LinkSortField::default(),
            order: SortOrder::default(),
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_sort(mut self, sort: LinkSortField, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }
}

/// Repository interface for short links.
///
/// Soft-deleted links are invisible to every method.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link, reserving its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code or custom alias is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<ShortLink>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShortLink>, AppError>;

    /// Returns one page of an owner's links and the total number of matches.
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        query: LinkListQuery,
    ) -> Result<(Vec<ShortLink>, i64), AppError>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    async fn update(&self, id: Uuid, patch: ShortLinkPatch) -> Result<ShortLink, AppError>;

    /// Soft-deletes a link. Returns `false` if nothing was deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Atomically adds one to `click_count` and refreshes `last_clicked_at`.
    ///
    /// Executed as a single statement so concurrent clicks never lose updates.
    async fn increment_click_count(&self, id: Uuid) -> Result<(), AppError>;

    async fn dashboard_summary(&self, owner_id: Uuid) -> Result<DashboardSummary, AppError>;

    /// Links with the highest click counts, descending.
    async fn top_performing(&self, owner_id: Uuid, limit: i64)
    -> Result<Vec<ShortLink>, AppError>;

    /// Most recently clicked links. Never-clicked links are excluded.
    async fn recently_clicked(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError>;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
