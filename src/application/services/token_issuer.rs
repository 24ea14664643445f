//! JWT issuance and validation.
//!
//! Three token kinds share one claim shape and are told apart by `purpose`:
//! access and refresh tokens for users, and short-lived unlock tokens scoped
//! to a single password-protected link.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    Refresh,
    LinkUnlock,
}

/// JWT claims. `sub` is a user id, or a link id for unlock tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

/// Signing secrets and lifetimes.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub unlock_ttl_seconds: i64,
}

/// Access and refresh tokens returned on login, registration and refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Mints and checks HS256 tokens.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    unlock_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(settings: TokenSettings) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(settings.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(settings.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(settings.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(settings.refresh_secret.as_bytes()),
            access_ttl: Duration::seconds(settings.access_ttl_seconds),
            refresh_ttl: Duration::seconds(settings.refresh_ttl_seconds),
            unlock_ttl: Duration::seconds(settings.unlock_ttl_seconds),
        }
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.sign(
                user_id,
                TokenPurpose::Access,
                self.access_ttl,
                &self.access_encoding,
            )?,
            refresh_token: self.sign(
                user_id,
                TokenPurpose::Refresh,
                self.refresh_ttl,
                &self.refresh_encoding,
            )?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Issues a single-purpose token that opens one password-protected link.
    pub fn issue_unlock(&self, link_id: Uuid) -> Result<String, AppError> {
        self.sign(
            link_id,
            TokenPurpose::LinkUnlock,
            self.unlock_ttl,
            &self.access_encoding,
        )
    }

    /// Returns the user id of a valid access token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for bad signatures, expiry or the wrong purpose.
    pub fn verify_access(&self, token: &str) -> Result<Uuid, AppError> {
        self.verify(token, TokenPurpose::Access, &self.access_decoding)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "Invalid or expired access token" }),
                )
            })
    }

    /// Returns the user id of a valid refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, AppError> {
        self.verify(token, TokenPurpose::Refresh, &self.refresh_decoding)
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "Invalid or expired refresh token" }),
                )
            })
    }

    /// Checks that `token` is a live unlock token for `link_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidToken`] otherwise.
    pub fn verify_unlock(&self, token: &str, link_id: Uuid) -> Result<(), AppError> {
        match self.verify(token, TokenPurpose::LinkUnlock, &self.access_decoding) {
            Some(sub) if sub == link_id => Ok(()),
            _ => Err(AppError::invalid_token(
                "Invalid or expired unlock token",
                json!({}),
            )),
        }
    }

    fn sign(
        &self,
        sub: Uuid,
        purpose: TokenPurpose,
        ttl: Duration,
        key: &EncodingKey,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            purpose,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, key).map_err(|e| {
            AppError::internal("Failed to sign token", json!({ "reason": e.to_string() }))
        })
    }

    fn verify(&self, token: &str, purpose: TokenPurpose, key: &DecodingKey) -> Option<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, key, &validation)
            .inspect_err(|e| tracing::debug!(error = %e, "Token rejected"))
            .ok()?;

        (data.claims.purpose == purpose).then_some(data.claims.sub)
    }
}

#[cfg(test)]
pub(crate) fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(TokenSettings {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_ttl_seconds: 900,
        refresh_ttl_seconds: 604_800,
        unlock_ttl_seconds: 60,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_round_trip() {
        let issuer = test_issuer();
        let user_id = Uuid::new_v4();

        let pair = issuer.issue_pair(user_id).unwrap();

        assert_eq!(issuer.verify_access(&pair.access_token).unwrap(), user_id);
        assert_eq!(issuer.verify_refresh(&pair.refresh_token).unwrap(), user_id);
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let issuer = test_issuer();
        let id = Uuid::new_v4();
        let pair = issuer.issue_pair(id).unwrap();
        let unlock = issuer.issue_unlock(id).unwrap();

        assert!(issuer.verify_access(&pair.refresh_token).is_err());
        assert!(issuer.verify_refresh(&pair.access_token).is_err());
        assert!(issuer.verify_access(&unlock).is_err());
        assert!(issuer.verify_unlock(&pair.access_token, id).is_err());
    }

    #[test]
    fn test_unlock_token_is_scoped_to_link() {
        let issuer = test_issuer();
        let link_id = Uuid::new_v4();
        let token = issuer.issue_unlock(link_id).unwrap();

        assert!(issuer.verify_unlock(&token, link_id).is_ok());

        let err = issuer.verify_unlock(&token, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken { .. }));
    }

    #[test]
    fn test_expired_unlock_token_is_rejected() {
        let issuer = TokenIssuer::new(TokenSettings {
            unlock_ttl_seconds: -10,
            ..test_settings()
        });
        let link_id = Uuid::new_v4();
        let token = issuer.issue_unlock(link_id).unwrap();

        assert!(issuer.verify_unlock(&token, link_id).is_err());
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let other = TokenIssuer::new(TokenSettings {
            access_secret: "someone-else".to_string(),
            ..test_settings()
        });
        let pair = other.issue_pair(Uuid::new_v4()).unwrap();

        assert!(test_issuer().verify_access(&pair.access_token).is_err());
        assert!(test_issuer().verify_access("not.a.jwt").is_err());
    }

    fn test_settings() -> TokenSettings {
        TokenSettings {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 604_800,
            unlock_ttl_seconds: 60,
        }
    }
}
