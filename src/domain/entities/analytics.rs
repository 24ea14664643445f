//! Transient analytics projections computed on demand.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use super::ShortLink;

/// Lookback window for per-link analytics.
///
/// Unrecognised tokens fall back to [`Period::AllTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Last24Hours,
    #[default]
    Last7Days,
    Last30Days,
    AllTime,
}

impl Period {
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "24h" => Period::Last24Hours,
            "7d" => Period::Last7Days,
            "30d" => Period::Last30Days,
            _ => Period::AllTime,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Last24Hours => "24h",
            Period::Last7Days => "7d",
            Period::Last30Days => "30d",
            Period::AllTime => "all",
        }
    }

    /// Lower bound of the window relative to `now`. All-time starts at the Unix epoch.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Period::Last24Hours => now - Duration::hours(24),
            Period::Last7Days => now - Duration::days(7),
            Period::Last30Days => now - Duration::days(30),
            Period::AllTime => DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// One bucket of a grouped breakdown, e.g. `("US", 42)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedCount {
    pub value: String,
    pub count: i64,
}

/// Clicks on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Composite per-link report.
///
/// Every field holds its zero value when the query behind it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnalytics {
    pub url_id: Uuid,
    pub period: Period,
    pub since: DateTime<Utc>,
    pub total_clicks: i64,
    pub top_referrer: String,
    pub top_country: String,
    pub clicks_over_time: Vec<DailyCount>,
    pub referrers: Vec<GroupedCount>,
    pub countries: Vec<GroupedCount>,
    pub devices: Vec<GroupedCount>,
    pub browsers: Vec<GroupedCount>,
    pub operating_systems: Vec<GroupedCount>,
}

/// Portfolio totals for one owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_urls: i64,
    pub total_clicks: i64,
    /// Active and not expired right now.
    pub active_urls: i64,
}

/// Composite per-user dashboard.
#[derive(Debug, Clone)]
pub struct UserDashboard {
    pub summary: DashboardSummary,
    pub top_performing: Vec<ShortLink>,
    pub recent_activity: Vec<ShortLink>,
}
