//! HTTP request handlers.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod analytics;
pub mod auth;
pub mod health;
pub mod links;
pub mod redirect;

pub use analytics::{dashboard_handler, link_analytics_handler};
pub use auth::{
    change_password_handler, login_handler, profile_handler, refresh_handler,
    regenerate_api_key_handler, register_handler, update_profile_handler,
};
pub use health::health_handler;
pub use links::{
    create_url_handler, delete_url_handler, get_url_handler, list_urls_handler, qr_code_handler,
    qr_download_handler, update_url_handler,
};
pub use redirect::{access_handler, info_handler, redirect_handler, unlock_handler};
