//! DTOs for per-link analytics and the user dashboard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{GroupedCount, LinkAnalytics, Period, ShortLink, UserDashboard};

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    pub period: Option<String>,
}

impl AnalyticsParams {
    /// Missing period means seven days; an unrecognised one means all time.
    pub fn period(&self) -> Period {
        self.period
            .as_deref()
            .map(Period::parse)
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsOverview {
    pub total_clicks: i64,
    pub top_referrer: String,
    pub top_country: String,
}

#[derive(Debug, Serialize)]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub clicks: i64,
}

#[derive(Debug, Serialize)]
pub struct Breakdown {
    pub value: String,
    pub count: i64,
}

impl From<GroupedCount> for Breakdown {
    fn from(g: GroupedCount) -> Self {
        Self {
            value: g.value,
            count: g.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkAnalyticsResponse {
    pub url_id: Uuid,
    pub period: &'static str,
    pub since: DateTime<Utc>,
    pub overview: AnalyticsOverview,
    pub clicks_over_time: Vec<DailyClicks>,
    pub referrers: Vec<Breakdown>,
    pub countries: Vec<Breakdown>,
    pub devices: Vec<Breakdown>,
    pub browsers: Vec<Breakdown>,
    pub operating_systems: Vec<Breakdown>,
}

fn breakdown(groups: Vec<GroupedCount>) -> Vec<Breakdown> {
    groups.into_iter().map(Breakdown::from).collect()
}

impl From<LinkAnalytics> for LinkAnalyticsResponse {
    fn from(a: LinkAnalytics) -> Self {
        Self {
            url_id: a.url_id,
            period: a.period.as_str(),
            since: a.since,
            overview: AnalyticsOverview {
                total_clicks: a.total_clicks,
                top_referrer: a.top_referrer,
                top_country: a.top_country,
            },
            clicks_over_time: a
                .clicks_over_time
                .into_iter()
                .map(|d| DailyClicks {
                    date: d.date,
                    clicks: d.count,
                })
                .collect(),
            referrers: breakdown(a.referrers),
            countries: breakdown(a.countries),
            devices: breakdown(a.devices),
            browsers: breakdown(a.browsers),
            operating_systems: breakdown(a.operating_systems),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_urls: i64,
    pub total_clicks: i64,
    pub active_urls: i64,
}

#[derive(Debug, Serialize)]
pub struct TopUrl {
    pub url_id: Uuid,
    pub short_code: String,
    pub title: Option<String>,
    pub click_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    pub url_id: Uuid,
    pub short_code: String,
    pub title: Option<String>,
    pub last_clicked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub summary: SummaryResponse,
    pub top_performing_urls: Vec<TopUrl>,
    pub recent_activity: Vec<RecentActivity>,
}

impl From<UserDashboard> for DashboardResponse {
    fn from(d: UserDashboard) -> Self {
        Self {
            summary: SummaryResponse {
                total_urls: d.summary.total_urls,
                total_clicks: d.summary.total_clicks,
                active_urls: d.summary.active_urls,
            },
            top_performing_urls: d
                .top_performing
                .into_iter()
                .map(|l: ShortLink| TopUrl {
                    url_id: l.id,
                    short_code: l.short_code,
                    title: l.title,
                    click_count: l.click_count,
                })
                .collect(),
            recent_activity: d
                .recent_activity
                .into_iter()
                .map(|l: ShortLink| RecentActivity {
                    url_id: l.id,
                    short_code: l.short_code,
                    title: l.title,
                    last_clicked_at: l.last_clicked_at,
                })
                .collect(),
        }
    }
}
