//! PostgreSQL repository tests.
//!
//! Run with a database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use url_shortener_analytics::domain::entities::{NewClick, NewShortLink, NewUser, ShortLinkPatch};
use url_shortener_analytics::domain::repositories::{
    ClickDimension, ClickRepository, LinkListQuery, LinkRepository, UserRepository,
};
use url_shortener_analytics::error::AppError;
use url_shortener_analytics::infrastructure::persistence::{
    PgClickRepository, PgLinkRepository, PgUserRepository,
};

async fn create_owner(pool: &Arc<PgPool>, email: &str) -> Uuid {
    PgUserRepository::new(pool.clone())
        .create(NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            api_key_hash: format!("key-{email}"),
            first_name: String::new(),
            last_name: String::new(),
        })
        .await
        .unwrap()
        .id
}

fn new_link(owner_id: Option<Uuid>, code: &str) -> NewShortLink {
    NewShortLink {
        owner_id,
        original_url: format!("https://example.com/{code}"),
        short_code: code.to_string(),
        custom_alias: None,
        title: Some(format!("Title {code}")),
        description: None,
        password_hash: None,
        expires_at: None,
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find(pool: PgPool) {
    let pool = Arc::new(pool);
    let repo = PgLinkRepository::new(pool.clone());
    let owner = create_owner(&pool, "a@example.com").await;

    let created = repo.create(new_link(Some(owner), "find01")).await.unwrap();
    assert_eq!(created.click_count, 0);
    assert!(created.is_active);

    let by_code = repo.find_by_short_code("find01").await.unwrap().unwrap();
    assert_eq!(by_code.id, created.id);

    let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.short_code, "find01");

    assert!(repo.find_by_short_code("missing").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_code_is_conflict(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    repo.create(new_link(None, "dup001")).await.unwrap();
    let err = repo.create(new_link(None, "dup001")).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_increments_are_not_lost(pool: PgPool) {
    const CLICKS: usize = 40;

    let repo = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let link = repo.create(new_link(None, "hot001")).await.unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..CLICKS {
        let repo = repo.clone();
        tasks.spawn(async move { repo.increment_click_count(link.id).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let link = repo.find_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(link.click_count, CLICKS as i64);
    assert!(link.last_clicked_at.is_some());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_and_soft_delete(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let mut input = new_link(None, "upd001");
    input.expires_at = Some(Utc::now() + Duration::days(1));
    let link = repo.create(input).await.unwrap();

    let updated = repo
        .update(
            link.id,
            ShortLinkPatch {
                title: Some("Renamed".to_string()),
                expires_at: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("Renamed"));
    assert!(updated.expires_at.is_none());

    assert!(repo.soft_delete(link.id).await.unwrap());
    assert!(!repo.soft_delete(link.id).await.unwrap());
    assert!(repo.find_by_short_code("upd001").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_by_owner_searches_and_counts(pool: PgPool) {
    let pool = Arc::new(pool);
    let repo = PgLinkRepository::new(pool.clone());
    let alice = create_owner(&pool, "alice@example.com").await;
    let bob = create_owner(&pool, "bob@example.com").await;

    for code in ["lst001", "lst002", "lst003"] {
        repo.create(new_link(Some(alice), code)).await.unwrap();
    }
    repo.create(new_link(Some(bob), "lst004")).await.unwrap();

    let (page, total) = repo
        .list_by_owner(alice, LinkListQuery::new(0, 2))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(total, 3);

    let (found, total) = repo
        .list_by_owner(
            alice,
            LinkListQuery::new(0, 20).with_search(Some("LST002".to_string())),
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].short_code, "lst002");
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_click_aggregates_respect_window(pool: PgPool) {
    let pool = Arc::new(pool);
    let links = PgLinkRepository::new(pool.clone());
    let clicks = PgClickRepository::new(pool);
    let link = links.create(new_link(None, "agg001")).await.unwrap();
    let now = Utc::now();

    for (days_ago, country) in [(10, "DE"), (10, "DE"), (1, "US"), (1, "US"), (1, "")] {
        clicks
            .store(NewClick {
                url_id: link.id,
                country: country.to_string(),
                clicked_at: now - Duration::days(days_ago),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let since = now - Duration::days(7);

    assert_eq!(clicks.count_since(link.id, since).await.unwrap(), 3);
    assert_eq!(
        clicks
            .top_value(link.id, since, ClickDimension::Country)
            .await
            .unwrap()
            .as_deref(),
        Some("US")
    );

    let countries = clicks
        .grouped_counts(link.id, since, ClickDimension::Country, 10)
        .await
        .unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].count, 2);

    let days = clicks.clicks_per_day(link.id, since).await.unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].count, 3);
}
