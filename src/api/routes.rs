//! API route configuration.

use crate::api::handlers::{
    change_password_handler, create_url_handler, dashboard_handler, delete_url_handler,
    get_url_handler, link_analytics_handler, list_urls_handler, login_handler, profile_handler,
    qr_code_handler, qr_download_handler, refresh_handler, regenerate_api_key_handler,
    register_handler, update_profile_handler, update_url_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Account endpoints that do not require authentication.
///
/// - `POST /auth/register` - Create an account
/// - `POST /auth/login`    - Exchange credentials for tokens
/// - `POST /auth/refresh`  - Exchange a refresh token for new tokens
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
}

/// Endpoints that require a Bearer token or API key.
///
/// - `POST   /urls`                     - Create a link
/// - `GET    /urls`                     - List own links (paginated, searchable)
/// - `GET    /urls/{url_id}`            - Link details
/// - `PUT    /urls/{url_id}`            - Partial update
/// - `DELETE /urls/{url_id}`            - Soft delete
/// - `GET    /urls/{url_id}/analytics`  - Per-link analytics
/// - `GET    /urls/{url_id}/qr`         - QR code
/// - `GET    /urls/{url_id}/qr/download` - QR code as an SVG attachment
/// - `GET    /analytics/dashboard`      - Portfolio dashboard
/// - `GET    /profile`                  - Own account
/// - `PUT    /profile`                  - Update first and last name
/// - `PUT    /profile/password`         - Change password
/// - `POST   /profile/api-key`          - Rotate API key
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", post(create_url_handler).get(list_urls_handler))
        .route(
            "/urls/{url_id}",
            get(get_url_handler)
                .put(update_url_handler)
                .delete(delete_url_handler),
        )
        .route("/urls/{url_id}/analytics", get(link_analytics_handler))
        .route("/urls/{url_id}/qr", get(qr_code_handler))
        .route("/urls/{url_id}/qr/download", get(qr_download_handler))
        .route("/analytics/dashboard", get(dashboard_handler))
        .route("/profile", get(profile_handler).put(update_profile_handler))
        .route("/profile/password", put(change_password_handler))
        .route("/profile/api-key", post(regenerate_api_key_handler))
}
