//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{DashboardSummary, NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::{LinkListQuery, LinkRepository};
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, owner_id, original_url, short_code, custom_alias, domain_id, \
     title, description, password_hash, is_active, click_count, unique_click_count, \
     expires_at, created_at, updated_at, last_clicked_at";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    original_url: String,
    short_code: String,
    custom_alias: Option<String>,
    domain_id: Option<Uuid>,
    title: Option<String>,
    description: Option<String>,
    password_hash: Option<String>,
    is_active: bool,
    click_count: i64,
    unique_click_count: i64,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_clicked_at: Option<DateTime<Utc>>,
}

impl From<LinkRow> for ShortLink {
    fn from(r: LinkRow) -> Self {
        ShortLink {
            id: r.id,
            owner_id: r.owner_id,
            original_url: r.original_url,
            short_code: r.short_code,
            custom_alias: r.custom_alias,
            domain_id: r.domain_id,
            title: r.title,
            description: r.description,
            password_hash: r.password_hash,
            is_active: r.is_active,
            click_count: r.click_count,
            unique_click_count: r.unique_click_count,
            expires_at: r.expires_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
            last_clicked_at: r.last_clicked_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    total_urls: i64,
    total_clicks: i64,
    active_urls: i64,
}

/// Escapes `LIKE` wildcards so user search text matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// PostgreSQL repository for short links.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let sql = format!(
            r#"
            INSERT INTO short_links
                (owner_id, original_url, short_code, custom_alias, title, description,
                 password_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(new_link.owner_id)
            .bind(&new_link.original_url)
            .bind(&new_link.short_code)
            .bind(&new_link.custom_alias)
            .bind(&new_link.title)
            .bind(&new_link.description)
            .bind(&new_link.password_hash)
            .bind(new_link.expires_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM short_links WHERE short_code = $1 AND deleted_at IS NULL"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShortLink>, AppError> {
        let sql =
            format!("SELECT {LINK_COLUMNS} FROM short_links WHERE id = $1 AND deleted_at IS NULL");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        query: LinkListQuery,
    ) -> Result<(Vec<ShortLink>, i64), AppError> {
        let pattern = query.search.as_deref().map(like_pattern);

        let filter = r#"
            owner_id = $1
            AND deleted_at IS NULL
            AND ($2::text IS NULL
                 OR title ILIKE $2
                 OR original_url ILIKE $2
                 OR short_code ILIKE $2)
        "#;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM short_links WHERE {filter}"))
                .bind(owner_id)
                .bind(&pattern)
                .fetch_one(self.pool.as_ref())
                .await?;

        // Sort column and direction come from closed enums.
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM short_links WHERE {filter} \
             ORDER BY {} {} NULLS LAST, id LIMIT $3 OFFSET $4",
            query.sort.column(),
            query.order.keyword()
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner_id)
            .bind(&pattern)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn update(&self, id: Uuid, patch: ShortLinkPatch) -> Result<ShortLink, AppError> {
        let sql = format!(
            r#"
            UPDATE short_links SET
                title = COALESCE($2::text, title),
                description = COALESCE($3::text, description),
                expires_at = CASE WHEN $4::boolean THEN $5::timestamptz ELSE expires_at END,
                is_active = COALESCE($6::boolean, is_active),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .bind(&patch.title)
            .bind(&patch.description)
            .bind(patch.expires_at.is_some())
            .bind(patch.expires_at.flatten())
            .bind(patch.is_active)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Into::into)
            .ok_or_else(|| AppError::not_found("URL not found", json!({ "url_id": id })))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET deleted_at = NOW(), is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_click_count(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE short_links
            SET click_count = click_count + 1, last_clicked_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn dashboard_summary(&self, owner_id: Uuid) -> Result<DashboardSummary, AppError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                COUNT(*) AS total_urls,
                COALESCE(SUM(click_count), 0)::BIGINT AS total_clicks,
                COUNT(*) FILTER (
                    WHERE is_active AND (expires_at IS NULL OR expires_at > NOW())
                ) AS active_urls
            FROM short_links
            WHERE owner_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(DashboardSummary {
            total_urls: row.total_urls,
            total_clicks: row.total_clicks,
            active_urls: row.active_urls,
        })
    }

    async fn top_performing(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM short_links \
             WHERE owner_id = $1 AND deleted_at IS NULL \
             ORDER BY click_count DESC LIMIT $2"
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner_id)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recently_clicked(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM short_links \
             WHERE owner_id = $1 AND deleted_at IS NULL AND last_clicked_at IS NOT NULL \
             ORDER BY last_clicked_at DESC LIMIT $2"
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner_id)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
