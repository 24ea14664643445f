//! Handlers for link management endpoints.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::links::{
    CreateUrlRequest, ListUrlsParams, QrParams, QrResponse, UpdateUrlRequest, UrlListResponse,
    UrlResponse,
};
use crate::api::dto::pagination::PaginationMeta;
use crate::api::extract::UrlId;
use crate::api::middleware::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::qr::{DEFAULT_QR_SIZE, clamp_qr_size, qr_data_uri};

/// Creates a short link owned by the caller.
///
/// # Endpoint
///
/// `POST /api/v1/urls`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/landing",
///   "custom_alias": "spring-sale",     // optional
///   "title": "Spring sale",            // optional
///   "password": "secret",              // optional
///   "expires_at": "2030-01-01T00:00:00Z" // optional
/// }
/// ```
///
/// The response embeds a QR code of the short URL. A QR rendering failure
/// only drops that field.
///
/// # Errors
///
/// - **400** on validation failure or a past expiry
/// - **409** if the custom alias is taken
pub async fn create_url_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create(Some(user_id), payload.into())
        .await?;

    let short_url = state.link_service.short_url(&link.short_code);
    let qr_code = qr_data_uri(&short_url, DEFAULT_QR_SIZE)
        .inspect_err(|e| tracing::warn!(url_id = %link.id, error = %e, "QR generation failed"))
        .ok();

    Ok((
        StatusCode::CREATED,
        Json(UrlResponse::new(link, short_url).with_qr_code(qr_code)),
    ))
}

/// Lists the caller's links.
///
/// # Endpoint
///
/// `GET /api/v1/urls?page=1&limit=20&search=sale&sort_by=click_count&order=desc`
///
/// `sort_by` accepts `created_at`, `click_count` or `title`; anything else sorts by creation time.
pub async fn list_urls_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<ListUrlsParams>,
) -> Result<Json<UrlListResponse>, AppError> {
    let query = params
        .to_query()
        .map_err(|msg| AppError::bad_request(msg, json!({})))?;
    let limit = query.limit;

    let (links, total) = state.link_service.list(user_id, query).await?;

    let urls = links
        .into_iter()
        .map(|link| {
            let short_url = state.link_service.short_url(&link.short_code);
            UrlResponse::new(link, short_url)
        })
        .collect();

    Ok(Json(UrlListResponse {
        urls,
        pagination: PaginationMeta::new(params.pagination.page(), limit, total),
    }))
}

/// `GET /api/v1/urls/{url_id}`
pub async fn get_url_handler(
    UrlId(url_id): UrlId,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<UrlResponse>, AppError> {
    let link = state.link_service.get(user_id, url_id).await?;
    let short_url = state.link_service.short_url(&link.short_code);

    Ok(Json(UrlResponse::new(link, short_url)))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PUT /api/v1/urls/{url_id}`
///
/// ```json
/// {
///   "title": "New title",
///   "expires_at": null,   // clears expiry; omit to leave unchanged
///   "is_active": false
/// }
/// ```
pub async fn update_url_handler(
    UrlId(url_id): UrlId,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<UpdateUrlRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update(user_id, url_id, payload.into())
        .await?;
    let short_url = state.link_service.short_url(&link.short_code);

    Ok(Json(UrlResponse::new(link, short_url)))
}

/// Soft-deletes a link. Its short code stops resolving immediately.
///
/// `DELETE /api/v1/urls/{url_id}` → **204 No Content**
pub async fn delete_url_handler(
    UrlId(url_id): UrlId,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(user_id, url_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/urls/{url_id}/qr?size=256`
///
/// Size is clamped to 64-1024 pixels.
pub async fn qr_code_handler(
    UrlId(url_id): UrlId,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<QrParams>,
) -> Result<Json<QrResponse>, AppError> {
    let size = clamp_qr_size(params.size.unwrap_or(DEFAULT_QR_SIZE));

    let qr_code = state.link_service.qr_code(user_id, url_id, size).await?;

    Ok(Json(QrResponse {
        url_id,
        size,
        format: "svg",
        qr_code,
        download_url: state.link_service.qr_download_url(url_id, size),
    }))
}

/// Serves the QR code as an SVG file attachment named `{short_code}_qrcode.svg`.
///
/// `GET /api/v1/urls/{url_id}/qr/download?size=256`
pub async fn qr_download_handler(
    UrlId(url_id): UrlId,
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<QrParams>,
) -> Result<impl IntoResponse, AppError> {
    let size = params.size.unwrap_or(DEFAULT_QR_SIZE);

    let (link, svg) = state.link_service.qr_svg(user_id, url_id, size).await?;

    let headers = [
        (header::CONTENT_TYPE, "image/svg+xml".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}_qrcode.svg\"", link.short_code),
        ),
    ];

    Ok((headers, svg))
}
