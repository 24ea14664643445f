//! Click entity representing one recorded visit to a short link.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted click. Never mutated after insertion.
///
/// Location and client fields are empty strings when enrichment had nothing to offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Click {
    pub id: Uuid,
    pub url_id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub browser: String,
    pub os: String,
    pub device_type: String,
    pub is_unique: bool,
    pub clicked_at: DateTime<Utc>,
}

/// Input data for recording a click.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewClick {
    pub url_id: Uuid,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub browser: String,
    pub os: String,
    pub device_type: String,
    pub is_unique: bool,
    pub clicked_at: DateTime<Utc>,
}
