//! Per-link analytics and per-user dashboards.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{LinkAnalytics, Period, ShortLink, UserDashboard};
use crate::domain::repositories::{ClickDimension, ClickRepository, LinkRepository};
use crate::error::AppError;

/// Buckets per grouped breakdown.
const BREAKDOWN_LIMIT: i64 = 10;

/// Rows in each dashboard list.
const DASHBOARD_LIST_LIMIT: i64 = 5;

/// Computes analytics on demand from stored clicks.
///
/// Sub-queries run concurrently. A failing sub-query is logged and its
/// section falls back to an empty value; the report as a whole still succeeds.
pub struct AnalyticsService<L, C>
where
    L: LinkRepository + ?Sized,
    C: ClickRepository + ?Sized,
{
    links: Arc<L>,
    clicks: Arc<C>,
}

impl<L, C> AnalyticsService<L, C>
where
    L: LinkRepository + ?Sized,
    C: ClickRepository + ?Sized,
{
    pub fn new(links: Arc<L>, clicks: Arc<C>) -> Self {
        Self { links, clicks }
    }

    /// Builds the analytics report for one link over `period`.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the link does not exist
    /// - [`AppError::Forbidden`] if `user_id` does not own it
    ///
    /// Both are checked before any click query runs.
    pub async fn link_analytics(
        &self,
        url_id: Uuid,
        user_id: Uuid,
        period: Period,
    ) -> Result<LinkAnalytics, AppError> {
        self.owned_link(url_id, user_id).await?;

        let since = period.since(Utc::now());
        let clicks = &self.clicks;

        let (total, referrer, country, per_day, referrers, countries, devices, browsers, oses) = tokio::join!(
            clicks.count_since(url_id, since),
            clicks.top_value(url_id, since, ClickDimension::Referer),
            clicks.top_value(url_id, since, ClickDimension::Country),
            clicks.clicks_per_day(url_id, since),
            clicks.grouped_counts(url_id, since, ClickDimension::Referer, BREAKDOWN_LIMIT),
            clicks.grouped_counts(url_id, since, ClickDimension::Country, BREAKDOWN_LIMIT),
            clicks.grouped_counts(url_id, since, ClickDimension::DeviceType, BREAKDOWN_LIMIT),
            clicks.grouped_counts(url_id, since, ClickDimension::Browser, BREAKDOWN_LIMIT),
            clicks.grouped_counts(url_id, since, ClickDimension::Os, BREAKDOWN_LIMIT),
        );

        Ok(LinkAnalytics {
            url_id,
            period,
            since,
            total_clicks: or_default(total, url_id, "total_clicks"),
            top_referrer: or_default(referrer, url_id, "top_referrer").unwrap_or_default(),
            top_country: or_default(country, url_id, "top_country").unwrap_or_default(),
            clicks_over_time: or_default(per_day, url_id, "clicks_over_time"),
            referrers: or_default(referrers, url_id, "referrers"),
            countries: or_default(countries, url_id, "countries"),
            devices: or_default(devices, url_id, "devices"),
            browsers: or_default(browsers, url_id, "browsers"),
            operating_systems: or_default(oses, url_id, "operating_systems"),
        })
    }

    /// Summarises every link owned by `user_id`.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<UserDashboard, AppError> {
        let links = &self.links;

        let (summary, top, recent) = tokio::join!(
            links.dashboard_summary(user_id),
            links.top_performing(user_id, DASHBOARD_LIST_LIMIT),
            links.recently_clicked(user_id, DASHBOARD_LIST_LIMIT),
        );

        Ok(UserDashboard {
            summary: or_default(summary, user_id, "summary"),
            top_performing: or_default(top, user_id, "top_performing_urls"),
            recent_activity: or_default(recent, user_id, "recent_activity"),
        })
    }

    async fn owned_link(&self, url_id: Uuid, user_id: Uuid) -> Result<ShortLink, AppError> {
        let link = self
            .links
            .find_by_id(url_id)
            .await?
            .ok_or_else(|| AppError::not_found("URL not found", json!({ "url_id": url_id })))?;

        if !link.is_owned_by(user_id) {
            return Err(AppError::forbidden(
                "Access denied",
                json!({ "url_id": url_id }),
            ));
        }

        Ok(link)
    }
}

fn or_default<T: Default>(result: Result<T, AppError>, id: Uuid, section: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(%id, section, error = %e, "Analytics query failed, returning empty section");
        T::default()
    })
}
