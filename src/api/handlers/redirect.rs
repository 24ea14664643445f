//! Handlers for the public redirect surface.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::api::dto::redirect::{AccessParams, LinkInfoResponse, UnlockRequest, UnlockResponse};
use crate::domain::click_event::ClickContext;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// HTML page shown by the bare redirect endpoint for unknown, inactive and
/// expired links.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub short_code: String,
}

/// Redirects a short code to its destination.
///
/// # Endpoint
///
/// `GET /{short_code}`
///
/// # Responses
///
/// - **302 Found** with `Location` set to the destination; one click is queued
/// - **401** `PASSWORD_PROTECTED` JSON when the link needs unlocking
/// - **404** HTML page for unknown, inactive or expired links (indistinguishable)
///
/// Click recording never delays the redirect. If the queue is full the click is dropped.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let context = click_context(&state, &headers, addr);

    match state
        .redirect_service
        .process_redirect(&short_code, context)
        .await
    {
        Ok(url) => found(url),
        Err(AppError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, NotFoundPage { short_code }).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Exchanges a password for a short-lived unlock token.
///
/// # Endpoint
///
/// `POST /{short_code}/unlock`
///
/// # Request Body
///
/// ```json
/// { "password": "secret" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "redirect_url": "https://sho.rt/abc123/access?token=eyJ...",
///   "access_token": "eyJ..."
/// }
/// ```
///
/// Following `redirect_url` completes the redirect and records the click.
///
/// # Errors
///
/// - **401** `INVALID_PASSWORD` on mismatch
/// - **404** for unknown, inactive, expired or unprotected links
pub async fn unlock_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>, AppError> {
    let grant = state
        .redirect_service
        .unlock(&short_code, &payload.password)
        .await?;

    Ok(Json(grant.into()))
}

/// Completes an unlock.
///
/// # Endpoint
///
/// `GET /{short_code}/access?token=<unlock token>`
///
/// # Errors
///
/// - **401** `INVALID_TOKEN` for a bad, expired or foreign token
/// - **404** if the link became inactive or expired meanwhile
pub async fn access_handler(
    Path(short_code): Path<String>,
    Query(params): Query<AccessParams>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, AppError> {
    let context = click_context(&state, &headers, addr);

    let url = state
        .redirect_service
        .confirm_unlock(&short_code, &params.token, context)
        .await?;

    Ok(found(url))
}

/// Public preview of a link. Does not count as a click.
///
/// # Endpoint
///
/// `GET /{short_code}/info`
///
/// Password-protected links hide `original_url` and `domain`.
pub async fn info_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkInfoResponse>, AppError> {
    let preview = state.redirect_service.public_info(&short_code).await?;
    Ok(Json(preview.into()))
}

/// `302 Found` with the destination in `Location`.
fn found(url: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
}

fn click_context(state: &AppState, headers: &HeaderMap, addr: SocketAddr) -> ClickContext {
    ClickContext::new(
        Some(client_ip(headers, addr, state.behind_proxy)),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    )
}
