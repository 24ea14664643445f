//! Click enrichment adapters.
//!
//! - [`MaxMindGeoLocator`] - GeoIP via a local MaxMind database
//! - [`WootheeParser`] - user-agent classification

pub mod geoip;
pub mod user_agent;

pub use geoip::MaxMindGeoLocator;
pub use user_agent::WootheeParser;
