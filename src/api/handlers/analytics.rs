//! Handlers for analytics endpoints.

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::api::dto::analytics::{AnalyticsParams, DashboardResponse, LinkAnalyticsResponse};
use crate::api::extract::UrlId;
use crate::api::middleware::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the analytics report for one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/v1/urls/{url_id}/analytics?period=7d`
///
/// `period` is `24h`, `7d` (default), `30d` or `all`. Any other value means all time.
///
/// # Response
///
/// ```json
/// {
///   "url_id": "…",
///   "period": "7d",
///   "since": "2025-02-22T10:00:00Z",
///   "overview": { "total_clicks": 2, "top_referrer": "", "top_country": "US" },
///   "clicks_over_time": [{ "date": "2025-02-28", "clicks": 2 }],
///   "referrers": [], "countries": [{ "value": "US", "count": 2 }],
///   "devices": [], "browsers": [], "operating_systems": []
/// }
/// ```
///
/// # Errors
///
/// - **403** if the link belongs to someone else
/// - **404** if the link does not exist
pub async fn link_analytics_handler(
    UrlId(url_id): UrlId,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<LinkAnalyticsResponse>, AppError> {
    let report = state
        .analytics_service
        .link_analytics(url_id, user_id, params.period())
        .await?;

    Ok(Json(report.into()))
}

/// `GET /api/v1/analytics/dashboard`
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = state.analytics_service.dashboard(user_id).await?;
    Ok(Json(dashboard.into()))
}
