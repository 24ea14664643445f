//! Business logic services for the application layer.

pub mod analytics_service;
pub mod auth_service;
pub mod link_service;
pub mod redirect_service;
pub mod token_issuer;

pub use analytics_service::AnalyticsService;
pub use auth_service::{AuthService, ProfileUpdate, RegisteredUser, Registration};
pub use link_service::{CreateLinkInput, LinkService};
pub use redirect_service::{LinkPreview, RedirectService, UnlockGrant};
pub use token_issuer::{TokenIssuer, TokenPair, TokenSettings};
