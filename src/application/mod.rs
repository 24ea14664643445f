//! Application layer services implementing business logic.
//!
//! Services consume repository traits and expose the operations HTTP handlers call.
//!
//! # Available Services
//!
//! - [`services::redirect_service::RedirectService`] - Short code resolution, unlock flow, click scheduling
//! - [`services::link_service::LinkService`] - Link creation and owner management
//! - [`services::analytics_service::AnalyticsService`] - Per-link analytics and user dashboards
//! - [`services::auth_service::AuthService`] - Accounts, login and request authentication
//! - [`services::token_issuer::TokenIssuer`] - JWT issuance and validation

pub mod services;
