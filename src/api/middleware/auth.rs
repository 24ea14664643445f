//! Request authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Authenticated caller, inserted into request extensions by [`layer`].
///
/// Handlers read it with `Extension(AuthUser(user_id))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Authenticates requests with a JWT access token or an API key.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <access token>
/// X-API-Key: <api key>
/// ```
///
/// The Bearer token wins when both are present.
///
/// # Errors
///
/// Returns `401 Unauthorized` with `WWW-Authenticate: Bearer` if neither header
/// is present or the credential is invalid, expired or belongs to a disabled account.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/urls", get(list_urls_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let bearer = AuthBearer::from_request_parts(&mut parts, &()).await.ok();

    let api_key = parts
        .headers
        .get(&API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let user_id = match (bearer, api_key) {
        (Some(AuthBearer(token)), _) => st.auth_service.authenticate_bearer(&token)?,
        (None, Some(key)) => st.auth_service.authenticate_api_key(&key).await?,
        (None, None) => {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Authorization header or X-API-Key is missing" }),
            ));
        }
    };

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(req).await)
}
