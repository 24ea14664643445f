#![allow(dead_code)]

use async_trait::async_trait;
use axum::Extension;
use axum::extract::ConnectInfo;
use axum::extract::connect_info::MockConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use url_shortener_analytics::application::services::TokenSettings;
use url_shortener_analytics::domain::click_event::ClickEvent;
use url_shortener_analytics::domain::click_worker::{ClickRecorder, run_click_worker};
use url_shortener_analytics::domain::enrichment::{
    ClientInfo, EnrichmentError, GeoLocation, GeoLocator, UserAgentParser,
};
use url_shortener_analytics::domain::entities::{
    Click, DailyCount, DashboardSummary, GroupedCount, NewClick, NewShortLink, NewUser, ShortLink,
    ShortLinkPatch, User,
};
use url_shortener_analytics::domain::repositories::{
    ClickDimension, ClickRepository, LinkListQuery, LinkRepository, LinkSortField, SortOrder,
    UserRepository,
};
use url_shortener_analytics::error::AppError;
use url_shortener_analytics::routes::app_router;
use url_shortener_analytics::state::{AppState, Repositories, StateOptions};

pub const BASE_URL: &str = "http://sho.rt";
pub const PASSWORD: &str = "correct horse battery";
/// Peer address every test request appears to come from.
pub const PEER_ADDR: ([u8; 4], u16) = ([203, 0, 113, 7], 12345);

// ---------------------------------------------------------------------------
// In-memory repositories
// ---------------------------------------------------------------------------

struct StoredLink {
    link: ShortLink,
    deleted: bool,
}

#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<Vec<StoredLink>>,
}

impl InMemoryLinkRepository {
    pub fn by_code(&self, short_code: &str) -> Option<ShortLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.link.short_code == short_code)
            .map(|s| s.link.clone())
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let mut links = self.links.lock().unwrap();

        let taken = links.iter().any(|s| {
            s.link.short_code == new_link.short_code
                || (new_link.custom_alias.is_some() && s.link.custom_alias == new_link.custom_alias)
        });
        if taken {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "short_links_short_code_key" }),
            ));
        }

        let now = Utc::now();
        let link = ShortLink {
            id: Uuid::new_v4(),
            owner_id: new_link.owner_id,
            original_url: new_link.original_url,
            short_code: new_link.short_code,
            custom_alias: new_link.custom_alias,
            domain_id: None,
            title: new_link.title,
            description: new_link.description,
            password_hash: new_link.password_hash,
            is_active: true,
            click_count: 0,
            unique_click_count: 0,
            expires_at: new_link.expires_at,
            created_at: now,
            updated_at: now,
            last_clicked_at: None,
        };

        links.push(StoredLink {
            link: link.clone(),
            deleted: false,
        });
        Ok(link)
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|s| !s.deleted && s.link.short_code == short_code)
            .map(|s| s.link.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ShortLink>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|s| !s.deleted && s.link.id == id)
            .map(|s| s.link.clone()))
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        query: LinkListQuery,
    ) -> Result<(Vec<ShortLink>, i64), AppError> {
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut matches: Vec<ShortLink> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.deleted && s.link.is_owned_by(owner_id))
            .map(|s| s.link.clone())
            .filter(|link| match &needle {
                Some(n) => {
                    link.original_url.to_lowercase().contains(n)
                        || link.short_code.to_lowercase().contains(n)
                        || link
                            .title
                            .as_deref()
                            .is_some_and(|t| t.to_lowercase().contains(n))
                }
                None => true,
            })
            .collect();

        matches.sort_by(|a, b| match query.sort {
            LinkSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            LinkSortField::ClickCount => a.click_count.cmp(&b.click_count),
            LinkSortField::Title => a.title.cmp(&b.title),
        });
        if query.order == SortOrder::Desc {
            matches.reverse();
        }

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn update(&self, id: Uuid, patch: ShortLinkPatch) -> Result<ShortLink, AppError> {
        let mut links = self.links.lock().unwrap();
        let stored = links
            .iter_mut()
            .find(|s| !s.deleted && s.link.id == id)
            .ok_or_else(|| AppError::not_found("URL not found", json!({ "url_id": id })))?;

        let link = &mut stored.link;
        if let Some(title) = patch.title {
            link.title = Some(title);
        }
        if let Some(description) = patch.description {
            link.description = Some(description);
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = expires_at;
        }
        if let Some(is_active) = patch.is_active {
            link.is_active = is_active;
        }
        link.updated_at = Utc::now();

        Ok(link.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut links = self.links.lock().unwrap();
        match links.iter_mut().find(|s| !s.deleted && s.link.id == id) {
            Some(stored) => {
                stored.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn increment_click_count(&self, id: Uuid) -> Result<(), AppError> {
        let mut links = self.links.lock().unwrap();
        if let Some(stored) = links.iter_mut().find(|s| s.link.id == id) {
            stored.link.click_count += 1;
            stored.link.last_clicked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn dashboard_summary(&self, owner_id: Uuid) -> Result<DashboardSummary, AppError> {
        let links = self.links.lock().unwrap();
        let owned: Vec<&ShortLink> = links
            .iter()
            .filter(|s| !s.deleted && s.link.is_owned_by(owner_id))
            .map(|s| &s.link)
            .collect();

        Ok(DashboardSummary {
            total_urls: owned.len() as i64,
            total_clicks: owned.iter().map(|l| l.click_count).sum(),
            active_urls: owned.iter().filter(|l| l.is_accessible()).count() as i64,
        })
    }

    async fn top_performing(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let (mut links, _) = self
            .list_by_owner(owner_id, LinkListQuery::new(0, i64::MAX))
            .await?;
        links.sort_by(|a, b| b.click_count.cmp(&a.click_count));
        links.truncate(limit as usize);
        Ok(links)
    }

    async fn recently_clicked(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ShortLink>, AppError> {
        let (mut links, _) = self
            .list_by_owner(owner_id, LinkListQuery::new(0, i64::MAX))
            .await?;
        links.retain(|l| l.last_clicked_at.is_some());
        links.sort_by(|a, b| b.last_clicked_at.cmp(&a.last_clicked_at));
        links.truncate(limit as usize);
        Ok(links)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryClickRepository {
    clicks: Mutex<Vec<Click>>,
}

impl InMemoryClickRepository {
    pub fn all(&self) -> Vec<Click> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.clicks.lock().unwrap().len()
    }

    fn window(&self, url_id: Uuid, since: DateTime<Utc>) -> Vec<Click> {
        self.clicks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.url_id == url_id && c.clicked_at >= since)
            .cloned()
            .collect()
    }

    fn counts(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
        dimension: ClickDimension,
    ) -> Vec<GroupedCount> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for click in self.window(url_id, since) {
            let value = dimension.value_of(&click);
            if !value.is_empty() {
                *counts.entry(value.to_string()).or_default() += 1;
            }
        }

        let mut grouped: Vec<GroupedCount> = counts
            .into_iter()
            .map(|(value, count)| GroupedCount { value, count })
            .collect();
        grouped.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        grouped
    }
}

#[async_trait]
impl ClickRepository for InMemoryClickRepository {
    async fn store(&self, click: NewClick) -> Result<Click, AppError> {
        let stored = Click {
            id: Uuid::new_v4(),
            url_id: click.url_id,
            ip_address: click.ip_address,
            user_agent: click.user_agent,
            referer: click.referer,
            country: click.country,
            region: click.region,
            city: click.city,
            browser: click.browser,
            os: click.os,
            device_type: click.device_type,
            is_unique: click.is_unique,
            clicked_at: click.clicked_at,
        };
        self.clicks.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn count_since(&self, url_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        Ok(self.window(url_id, since).len() as i64)
    }

    async fn top_value(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
        dimension: ClickDimension,
    ) -> Result<Option<String>, AppError> {
        Ok(self
            .counts(url_id, since, dimension)
            .into_iter()
            .next()
            .map(|g| g.value))
    }

    async fn clicks_per_day(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>, AppError> {
        let mut days: HashMap<chrono::NaiveDate, i64> = HashMap::new();
        for click in self.window(url_id, since) {
            *days.entry(click.clicked_at.date_naive()).or_default() += 1;
        }

        let mut daily: Vec<DailyCount> = days
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect();
        daily.sort_by_key(|d| d.date);
        Ok(daily)
    }

    async fn grouped_counts(
        &self,
        url_id: Uuid,
        since: DateTime<Utc>,
        dimension: ClickDimension,
        limit: i64,
    ) -> Result<Vec<GroupedCount>, AppError> {
        let mut grouped = self.counts(url_id, since, dimension);
        grouped.truncate(limit as usize);
        Ok(grouped)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "users_email_key" }),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            api_key_hash: Some(new_user.api_key_hash),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            is_active: true,
            plan_type: "free".to_string(),
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.api_key_hash.as_deref() == Some(api_key_hash))
            .cloned())
    }

    async fn set_api_key_hash(&self, id: Uuid, api_key_hash: &str) -> Result<(), AppError> {
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.api_key_hash = Some(api_key_hash.to_string());
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.first_name = first_name.to_string();
            user.last_name = last_name.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Enrichment stand-ins
// ---------------------------------------------------------------------------

pub struct FixedGeoLocator;

#[async_trait]
impl GeoLocator for FixedGeoLocator {
    async fn lookup(&self, _ip: &str) -> Result<GeoLocation, EnrichmentError> {
        Ok(GeoLocation {
            country: "US".to_string(),
            region: "California".to_string(),
            city: "San Francisco".to_string(),
        })
    }
}

pub struct FailingGeoLocator;

#[async_trait]
impl GeoLocator for FailingGeoLocator {
    async fn lookup(&self, _ip: &str) -> Result<GeoLocation, EnrichmentError> {
        Err(EnrichmentError::Lookup("database unavailable".to_string()))
    }
}

pub struct DesktopParser;

impl UserAgentParser for DesktopParser {
    fn parse(&self, user_agent: &str) -> ClientInfo {
        if user_agent.is_empty() {
            return ClientInfo {
                device_type: "unknown".to_string(),
                ..Default::default()
            };
        }
        ClientInfo {
            browser: "Firefox".to_string(),
            os: "Linux".to_string(),
            device_type: "desktop".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application under test
// ---------------------------------------------------------------------------

pub fn test_options() -> StateOptions {
    StateOptions {
        base_url: BASE_URL.to_string(),
        tokens: TokenSettings {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 604_800,
            unlock_ttl_seconds: 60,
        },
        api_key_secret: "test-signing-secret".to_string(),
        behind_proxy: false,
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub links: Arc<InMemoryLinkRepository>,
    pub clicks: Arc<InMemoryClickRepository>,
    pub users: Arc<InMemoryUserRepository>,
    /// Queue receiver, present only when the app was built without a worker.
    pub pending_clicks: Option<mpsc::Receiver<ClickEvent>>,
}

pub struct TestAppBuilder {
    geo_locator: Arc<dyn GeoLocator>,
    queue_capacity: usize,
    with_worker: bool,
}

impl TestAppBuilder {
    pub fn geo_locator(mut self, geo_locator: Arc<dyn GeoLocator>) -> Self {
        self.geo_locator = geo_locator;
        self
    }

    /// Leaves the queue undrained so tests can inspect or overflow it.
    pub fn without_worker(mut self, queue_capacity: usize) -> Self {
        self.with_worker = false;
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn build(self) -> TestApp {
        let links = Arc::new(InMemoryLinkRepository::default());
        let clicks = Arc::new(InMemoryClickRepository::default());
        let users = Arc::new(InMemoryUserRepository::default());

        let (tx, rx) = mpsc::channel(self.queue_capacity);

        let pending_clicks = if self.with_worker {
            let recorder = Arc::new(ClickRecorder::new(
                links.clone(),
                clicks.clone(),
                self.geo_locator,
                Arc::new(DesktopParser),
                Duration::from_millis(200),
            ));
            tokio::spawn(run_click_worker(rx, recorder, 4));
            None
        } else {
            Some(rx)
        };

        let state = AppState::new(
            Repositories {
                links: links.clone(),
                clicks: clicks.clone(),
                users: users.clone(),
            },
            test_options(),
            tx,
        );

        // The rate limiter's key extractor reads `ConnectInfo` from the request
        // extensions, which `MockConnectInfo` alone does not populate.
        let app = app_router(state.clone())
            .layer(MockConnectInfo(SocketAddr::from(PEER_ADDR)))
            .layer(Extension(ConnectInfo(SocketAddr::from(PEER_ADDR))));
        let server = TestServer::new(app).unwrap();

        TestApp {
            server,
            state,
            links,
            clicks,
            users,
            pending_clicks,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            geo_locator: Arc::new(FixedGeoLocator),
            queue_capacity: 1024,
            with_worker: true,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Registers an account and returns its access token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .server
            .post("/api/v1/auth/register")
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "first_name": "Ada",
                "last_name": "Lovelace"
            }))
            .await;

        assert_eq!(response.status_code(), 201, "{}", response.text());
        let body: Value = response.json();
        body["tokens"]["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a link through the API and returns the response body.
    pub async fn create_link(&self, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post("/api/v1/urls")
            .add_header("Authorization", format!("Bearer {token}"))
            .json(&body)
            .await;

        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json()
    }

    /// Waits until the worker has stored at least `count` clicks.
    pub async fn wait_for_clicks(&self, count: usize) {
        for _ in 0..300 {
            if self.clicks.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {count} clicks, worker stored {}",
            self.clicks.len()
        );
    }
}
