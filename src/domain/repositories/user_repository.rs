//! Repository trait for user accounts.

use crate::domain::entities::{NewUser, User};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository interface for users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<User>, AppError>;

    async fn set_api_key_hash(&self, id: Uuid, api_key_hash: &str) -> Result<(), AppError>;

    /// Replaces the display names. Returns `None` if the user does not exist.
    async fn update_profile(
        &self,
        id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<User>, AppError>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError>;
}
