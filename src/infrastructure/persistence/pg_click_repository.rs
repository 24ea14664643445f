//! PostgreSQL implementation of the click repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{Click, DailyCount, GroupedCount, NewClick};
use crate::domain::repositories::{ClickDimension, ClickRepository};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: Uuid,
    url_id: Uuid,
    ip_address: String,
    user_agent: String,
    referer: String,
    country: String,
    region: String,
    city: String,
    browser: String,
    os: String,
    device_type: String,
    is_unique: bool,
    clicked_at: DateTime<Utc>,
}

impl From<ClickRow> for Click {
    fn from(r: ClickRow) -> Self {
        Click {
            id: r.id,
            url_id: r.url_id,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            referer: r.referer,
            country: r.country,
            region: r.region,
            city: r.city,
            browser: r.browser,
            os: r.os,
            device_type: r.device_type,
            is_unique: r.is_unique,
            clicked_at: r.clicked_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DayRow {
    day: NaiveDate,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    value: String,
    count: i64,
}

/// PostgreSQL repository for click events and their aggregates.
///
/// Aggregates are plain `GROUP BY` queries over `clicks`, served by the
/// `(url_id, clicked_at)` index.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn store(&self, click: NewClick) -> Result<Click, AppError> {
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO clicks
                (url_id, ip_address, user_agent, referer, country, region, city,
                 browser, os, device_type, is_unique, clicked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, url_id, ip_address, user_agent, referer, country, region, city,
                      browser, os, device_type, is_unique, clicked_at
            "#,
        )
        .bind(click.url_id)
        .bind(&click.ip_address)
        .bind(&click.user_agent)
        .bind(&click.referer)
        .bind(&click.country)
        .bind(&click.region)
        .bind(&click.city)
        .bind(&click.browser)
        .bind(&click.os)
        .bind(&click.device_type)
        .bind(click.is_unique)
        .bind(click.clicked_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn count_since(&self, url_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM clicks WHERE url_id = $1 AND clicked_at >= $2")
                .bind(url_id)
                .bind(since)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(total)
    }

    async fn top_value(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
        dimension: ClickDimension,
    ) -> Result<Option<String>, AppError> {
        let column = dimension.column();
        let sql = format!(
            "SELECT {column} FROM clicks \
             WHERE url_id = $1 AND clicked_at >= $2 AND {column} <> '' \
             GROUP BY {column} ORDER BY COUNT(*) DESC LIMIT 1"
        );

        let value: Option<String> = sqlx::query_scalar(&sql)
            .bind(url_id)
            .bind(since)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(value)
    }

    async fn clicks_per_day(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, AppError> {
        let rows = sqlx::query_as::<_, DayRow>(
            r#"
            SELECT (clicked_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
            FROM clicks
            WHERE url_id = $1 AND clicked_at >= $2
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(url_id)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DailyCount {
                date: r.day,
                count: r.count,
            })
            .collect())
    }

    async fn grouped_counts(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
        dimension: ClickDimension,
        limit: i64,
    ) -> Result<Vec<GroupedCount>, AppError> {
        let column = dimension.column();
        let sql = format!(
            "SELECT {column} AS value, COUNT(*) AS count FROM clicks \
             WHERE url_id = $1 AND clicked_at >= $2 AND {column} <> '' \
             GROUP BY {column} ORDER BY count DESC LIMIT $3"
        );

        let rows = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(url_id)
            .bind(since)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| GroupedCount {
                value: r.value,
                count: r.count,
            })
            .collect())
    }
}
