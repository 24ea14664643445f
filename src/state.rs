//! Shared application state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{
    AnalyticsService, AuthService, LinkService, RedirectService, TokenIssuer, TokenSettings,
};
use crate::config::Config;
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{ClickRepository, LinkRepository, UserRepository};
use crate::utils::api_key::ApiKeyHasher;

/// Storage backends behind the services.
///
/// Production wires the PostgreSQL repositories; integration tests wire
/// in-memory fakes.
#[derive(Clone)]
pub struct Repositories {
    pub links: Arc<dyn LinkRepository>,
    pub clicks: Arc<dyn ClickRepository>,
    pub users: Arc<dyn UserRepository>,
}

/// Settings the services need at construction time.
#[derive(Debug, Clone)]
pub struct StateOptions {
    pub base_url: String,
    pub tokens: TokenSettings,
    pub api_key_secret: String,
    pub behind_proxy: bool,
}

impl From<&Config> for StateOptions {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.server.base_url.clone(),
            tokens: config.auth.token_settings(),
            api_key_secret: config.auth.api_key_secret.clone(),
            behind_proxy: config.server.behind_proxy,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<RedirectService<dyn LinkRepository>>,
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub analytics_service: Arc<AnalyticsService<dyn LinkRepository, dyn ClickRepository>>,
    pub auth_service: Arc<AuthService<dyn UserRepository>>,
    pub link_repository: Arc<dyn LinkRepository>,
    pub click_sender: mpsc::Sender<ClickEvent>,
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        options: StateOptions,
        click_sender: mpsc::Sender<ClickEvent>,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::new(options.tokens));

        Self {
            redirect_service: Arc::new(RedirectService::new(
                repositories.links.clone(),
                tokens.clone(),
                click_sender.clone(),
                options.base_url.clone(),
            )),
            link_service: Arc::new(LinkService::new(
                repositories.links.clone(),
                options.base_url,
            )),
            analytics_service: Arc::new(AnalyticsService::new(
                repositories.links.clone(),
                repositories.clicks,
            )),
            auth_service: Arc::new(AuthService::new(
                repositories.users,
                tokens,
                ApiKeyHasher::new(options.api_key_secret),
            )),
            link_repository: repositories.links,
            click_sender,
            behind_proxy: options.behind_proxy,
        }
    }
}
