//! Short code generation and custom alias validation.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Random bytes per generated code. Six bytes encode to eight base64url characters.
const CODE_LENGTH_BYTES: usize = 6;

const ALIAS_MIN_LEN: usize = 3;
const ALIAS_MAX_LEN: usize = 32;

/// Aliases that would shadow service routes.
const RESERVED_ALIASES: &[&str] = &[
    "api",
    "health",
    "admin",
    "static",
    "login",
    "register",
    "dashboard",
    "docs",
];

/// Generates a random short code.
///
/// Uses `getrandom` for entropy and encodes the result as URL-safe base64
/// without padding. Uniqueness is enforced by the store, not here.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random source fails.
pub fn generate_code() -> Result<String, AppError> {
    let mut buffer = [0u8; CODE_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate short code",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Validates a user-chosen alias.
///
/// # Rules
///
/// - Length: 3-32 characters
/// - Allowed characters: ASCII letters, digits, `-` and `_`
/// - Cannot be a reserved route name (case-insensitive)
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_alias(alias: &str) -> Result<(), AppError> {
    if alias.len() < ALIAS_MIN_LEN || alias.len() > ALIAS_MAX_LEN {
        return Err(AppError::bad_request(
            format!("Custom alias must be {ALIAS_MIN_LEN}-{ALIAS_MAX_LEN} characters"),
            json!({ "provided_length": alias.len() }),
        ));
    }

    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::bad_request(
            "Custom alias can only contain letters, digits, hyphens and underscores",
            json!({ "custom_alias": alias }),
        ));
    }

    if RESERVED_ALIASES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(alias))
    {
        return Err(AppError::bad_request(
            "This alias is reserved",
            json!({ "custom_alias": alias }),
        ));
    }

    Ok(())
}
