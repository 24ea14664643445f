//! Top-level router combining the redirect surface and the REST API.
//!
//! # Route Structure
//!
//! - `GET  /health`                  - Health check: DB, click queue (public)
//! - `GET  /{short_code}`            - Redirect (public)
//! - `POST /{short_code}/unlock`     - Password unlock (public)
//! - `GET  /{short_code}/access`     - Unlock confirmation (public, token in query)
//! - `GET  /{short_code}/info`       - Link preview (public)
//! - `/api/v1/auth/*`                - Registration and login (public, strict rate limit)
//! - `/api/v1/*`                     - Link management and analytics (Bearer token or API key)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-peer-IP token bucket on API routes, stricter on
//!   credential checks (auth endpoints, link unlock and access)
//! - **Authentication** - JWT access token or API key
//!
//! Trailing-slash normalization wraps the whole router in [`crate::server`].

use crate::api;
use crate::api::handlers::{
    access_handler, health_handler, info_handler, redirect_handler, unlock_handler,
};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
///
/// Handlers that record clicks read the peer address, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app_router(state: AppState) -> Router {
    let auth_routes = api::routes::public_routes().layer(rate_limit::secure_layer());

    let protected_routes = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::layer());

    let api_router = Router::new().merge(auth_routes).merge(protected_routes);

    let unlock_routes = Router::new()
        .route("/{short_code}/unlock", post(unlock_handler))
        .route("/{short_code}/access", get(access_handler))
        .layer(rate_limit::secure_layer());

    Router::new()
        .route("/health", get(health_handler))
        .route("/{short_code}", get(redirect_handler))
        .route("/{short_code}/info", get(info_handler))
        .merge(unlock_routes)
        .nest("/api/v1", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
