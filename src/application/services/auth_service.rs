//! Account registration, login and request authentication.

use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::token_issuer::{TokenIssuer, TokenPair};
use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::api_key::{ApiKeyHasher, generate_api_key};
use crate::utils::password::{hash_password, verify_password};

/// Input for [`AuthService::register`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// A freshly created account. `api_key` is the only time the raw key is visible.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: User,
    pub api_key: String,
    pub tokens: TokenPair,
}

/// Input for [`AuthService::update_profile`]. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Service for user accounts and request authentication.
///
/// Passwords are stored as Argon2 hashes. API keys are hashed with HMAC-SHA256
/// (keyed by a server secret) before storage and comparison.
pub struct AuthService<U: UserRepository + ?Sized> {
    repository: Arc<U>,
    tokens: Arc<TokenIssuer>,
    api_keys: ApiKeyHasher,
}

impl<U: UserRepository + ?Sized> AuthService<U> {
    pub fn new(repository: Arc<U>, tokens: Arc<TokenIssuer>, api_keys: ApiKeyHasher) -> Self {
        Self {
            repository,
            tokens,
            api_keys,
        }
    }

    /// Creates an account with a fresh API key and signs the user in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<RegisteredUser, AppError> {
        let email = normalize_email(&registration.email);

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(
                "Email already registered",
                json!({ "email": email }),
            ));
        }

        let api_key = generate_api_key()?;
        let new_user = NewUser {
            email,
            password_hash: hash_password(&registration.password)?,
            api_key_hash: self.api_keys.hash(&api_key),
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
        };

        let user = self.repository.create(new_user).await?;
        let tokens = self.tokens.issue_pair(user.id)?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(RegisteredUser {
            user,
            api_key,
            tokens,
        })
    }

    /// Verifies credentials and issues a token pair.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        let invalid = || {
            AppError::unauthorized(
                "Invalid email or password",
                json!({ "reason": "INVALID_CREDENTIALS" }),
            )
        };

        let user = self
            .repository
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash) {
            return Err(invalid());
        }

        if !user.is_active {
            return Err(AppError::unauthorized(
                "Account is disabled",
                json!({ "reason": "ACCOUNT_DISABLED" }),
            ));
        }

        if let Err(e) = self.repository.touch_last_login(user.id).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to update last login");
        }

        let tokens = self.tokens.issue_pair(user.id)?;
        Ok((user, tokens))
    }

    /// Exchanges a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let user_id = self.tokens.verify_refresh(refresh_token)?;
        self.active_user(user_id).await?;
        self.tokens.issue_pair(user_id)
    }

    /// Resolves a Bearer access token to a user id.
    pub fn authenticate_bearer(&self, token: &str) -> Result<Uuid, AppError> {
        self.tokens.verify_access(token)
    }

    /// Resolves an `X-API-Key` value to a user id.
    pub async fn authenticate_api_key(&self, api_key: &str) -> Result<Uuid, AppError> {
        let key_hash = self.api_keys.hash(api_key);

        match self.repository.find_by_api_key_hash(&key_hash).await? {
            Some(user) if user.is_active => Ok(user.id),
            _ => Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Invalid API key" }),
            )),
        }
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, AppError> {
        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "user_id": user_id })))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let current = self.profile(user_id).await?;

        let first_name = update
            .first_name
            .map_or(current.first_name, |name| name.trim().to_string());
        let last_name = update
            .last_name
            .map_or(current.last_name, |name| name.trim().to_string());

        self.repository
            .update_profile(user_id, &first_name, &last_name)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "user_id": user_id })))
    }

    /// Replaces the password after checking the current one.
    ///
    /// Issued tokens and the API key stay valid.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidPassword`] with reason
    /// `PROFILE_INVALID_CURRENT_PASSWORD` if `current_password` does not match.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.profile(user_id).await?;

        if !verify_password(current_password, &user.password_hash) {
            return Err(AppError::invalid_password(
                "Current password is incorrect",
                json!({ "reason": "PROFILE_INVALID_CURRENT_PASSWORD" }),
            ));
        }

        self.repository
            .set_password_hash(user_id, &hash_password(new_password)?)
            .await?;

        tracing::info!(%user_id, "Password changed");
        Ok(())
    }

    /// Replaces the user's API key. The old key stops working immediately.
    pub async fn regenerate_api_key(&self, user_id: Uuid) -> Result<String, AppError> {
        self.profile(user_id).await?;

        let api_key = generate_api_key()?;
        self.repository
            .set_api_key_hash(user_id, &self.api_keys.hash(&api_key))
            .await?;

        tracing::info!(%user_id, "API key regenerated");
        Ok(api_key)
    }

    async fn active_user(&self, user_id: Uuid) -> Result<User, AppError> {
        match self.repository.find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "User not found or disabled" }),
            )),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
