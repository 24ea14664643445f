//! Contracts for click enrichment.
//!
//! Enrichment is best effort. Callers turn any error into empty fields and keep going.

use async_trait::async_trait;

/// Geographic location resolved from a client IP. Empty strings mean unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: String,
    pub region: String,
    pub city: String,
}

/// Browser, OS and device class derived from a user-agent string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub browser: String,
    pub os: String,
    pub device_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("GeoIP lookup failed: {0}")]
    Lookup(String),

    #[error("GeoIP lookup timed out")]
    Timeout,
}

/// Resolves a client IP to a location.
///
/// # Implementations
///
/// - [`crate::infrastructure::enrichment::MaxMindGeoLocator`] - MaxMind City database
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Looks up `ip`. An unparseable address or a missing record yields an empty location.
    async fn lookup(&self, ip: &str) -> Result<GeoLocation, EnrichmentError>;
}

/// Classifies a user-agent string.
///
/// # Implementations
///
/// - [`crate::infrastructure::enrichment::WootheeParser`] - `woothee` based classifier
pub trait UserAgentParser: Send + Sync {
    /// Never fails; unrecognised agents yield empty browser and OS.
    fn parse(&self, user_agent: &str) -> ClientInfo;
}
