//! Destination URL validation and inspection.

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

/// Checks that `input` is an absolute HTTP(S) URL with a host.
///
/// Returns the trimmed input unchanged so redirects go exactly where the owner asked.
/// Rejects `javascript:`, `data:`, `file:` and other non-web schemes.
pub fn validate_destination(input: &str) -> Result<String, DestinationError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|e| DestinationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(DestinationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(DestinationError::MissingHost);
    }

    Ok(trimmed.to_string())
}

/// Hostname of a destination, or an empty string if it cannot be parsed.
pub fn destination_domain(input: &str) -> String {
    Url::parse(input)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
