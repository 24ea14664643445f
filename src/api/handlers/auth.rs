//! Handlers for account registration, login and profile endpoints.

use axum::{Extension, Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::auth::{
    ApiKeyResponse, AuthResponse, ChangePasswordRequest, LoginRequest, RefreshRequest,
    RegisterRequest, TokenResponse, UpdateProfileRequest, UserResponse,
};
use crate::api::middleware::AuthUser;
use crate::application::services::{ProfileUpdate, Registration};
use crate::error::AppError;
use crate::state::AppState;

/// Creates an account.
///
/// # Endpoint
///
/// `POST /api/v1/auth/register`
///
/// The response contains the account's API key. It is never shown again.
///
/// # Errors
///
/// - **400** on validation failure
/// - **409** if the email is already registered
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let registered = state
        .auth_service
        .register(Registration {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: registered.user.into(),
            tokens: registered.tokens.into(),
            api_key: Some(registered.api_key),
        }),
    ))
}

/// `POST /api/v1/auth/login`
///
/// Unknown email and wrong password both answer **401**.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let (user, tokens) = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        tokens: tokens.into(),
        api_key: None,
    }))
}

/// `POST /api/v1/auth/refresh`
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;

    let tokens = state.auth_service.refresh(&payload.refresh_token).await?;
    Ok(Json(tokens.into()))
}

/// `GET /api/v1/profile`
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth_service.profile(user_id).await?;
    Ok(Json(user.into()))
}

/// `PUT /api/v1/profile`
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    let user = state
        .auth_service
        .update_profile(
            user_id,
            ProfileUpdate {
                first_name: payload.first_name,
                last_name: payload.last_name,
            },
        )
        .await?;

    Ok(Json(user.into()))
}

/// Changes the caller's password.
///
/// `PUT /api/v1/profile/password` → **204 No Content**
///
/// # Errors
///
/// - **400** if the new password is too short
/// - **401** `INVALID_PASSWORD` if the current password is wrong
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    state
        .auth_service
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Issues a new API key and revokes the old one.
///
/// `POST /api/v1/profile/api-key`
pub async fn regenerate_api_key_handler(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ApiKeyResponse>, AppError> {
    let api_key = state.auth_service.regenerate_api_key(user_id).await?;
    Ok(Json(ApiKeyResponse { api_key }))
}
