//! Request extractors whose rejections use the JSON error envelope.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;

/// The `{url_id}` path segment of `/api/v1/urls/{url_id}/...`.
///
/// A malformed id is a `400 VALIDATION_ERROR` rather than axum's plain-text
/// path rejection.
#[derive(Debug, Clone, Copy)]
pub struct UrlId(pub Uuid);

impl<S> FromRequestParts<S> for UrlId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(url_id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::bad_request(
                    "Invalid URL id",
                    json!({ "url_id": rejection.body_text() }),
                )
            })?;

        Ok(Self(url_id))
    }
}
