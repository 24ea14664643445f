//! API key generation and keyed hashing.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const API_KEY_BYTES: usize = 32;

/// Generates a raw API key: 32 random bytes, base64url without padding.
pub fn generate_api_key() -> Result<String, AppError> {
    let mut buffer = [0u8; API_KEY_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate API key",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Hashes API keys with HMAC-SHA256 before storage and lookup.
///
/// Someone with read access to the database cannot verify or forge keys
/// without the server-side secret.
#[derive(Clone)]
pub struct ApiKeyHasher {
    secret: String,
}

impl ApiKeyHasher {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Returns a 64-character lowercase hex-encoded MAC.
    pub fn hash(&self, api_key: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(api_key.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_shape() {
        let key = generate_api_key().unwrap();
        assert_eq!(key.len(), 43);
        assert!(!key.contains('='));
    }

    #[test]
    fn test_hash_is_stable_and_hex() {
        let hasher = ApiKeyHasher::new("secret");

        let a = hasher.hash("key");
        assert_eq!(a, hasher.hash("key"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_secret_matters() {
        assert_ne!(
            ApiKeyHasher::new("secret-a").hash("key"),
            ApiKeyHasher::new("secret-b").hash("key")
        );
    }
}
