//! Repository trait for click storage and aggregate queries.

use crate::domain::entities::{Click, DailyCount, GroupedCount, NewClick};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Click attribute that analytics can group by.
///
/// Closed set so that column names never come from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickDimension {
    Referer,
    Country,
    DeviceType,
    Browser,
    Os,
}

impl ClickDimension {
    pub fn column(&self) -> &'static str {
        match self {
            ClickDimension::Referer => "referer",
            ClickDimension::Country => "country",
            ClickDimension::DeviceType => "device_type",
            ClickDimension::Browser => "browser",
            ClickDimension::Os => "os",
        }
    }

    /// Reads the matching field of a click.
    pub fn value_of<'a>(&self, click: &'a Click) -> &'a str {
        match self {
            ClickDimension::Referer => &click.referer,
            ClickDimension::Country => &click.country,
            ClickDimension::DeviceType => &click.device_type,
            ClickDimension::Browser => &click.browser,
            ClickDimension::Os => &click.os,
        }
    }
}

/// Repository interface for click events.
///
/// Clicks are append-only. Every read is scoped to one link and to
/// `clicked_at >= since`. Empty dimension values never appear in results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends a click.
    async fn store(&self, click: NewClick) -> Result<Click, AppError>;

    async fn count_since(&self, url_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError>;

    /// Most frequent non-empty value of `dimension`, if any.
    async fn top_value(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
        dimension: ClickDimension,
    ) -> Result<Option<String>, AppError>;

    /// Clicks per UTC calendar day, ascending by date.
    async fn clicks_per_day(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, AppError>;

    /// Up to `limit` buckets of `dimension`, descending by count.
    async fn grouped_counts(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
        dimension: ClickDimension,
        limit: i64,
    ) -> Result<Vec<GroupedCount>, AppError>;
}
