//! GeoIP lookup backed by a MaxMind City database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use maxminddb::{Reader, geoip2};
use std::net::IpAddr;
use std::sync::Arc;

use crate::domain::enrichment::{EnrichmentError, GeoLocation, GeoLocator};

/// Resolves IPs with a MaxMind GeoLite2/GeoIP2 City database held in memory.
///
/// Without a database file the locator is disabled and every lookup
/// returns an empty location.
#[derive(Clone)]
pub struct MaxMindGeoLocator {
    reader: Option<Arc<Reader<Vec<u8>>>>,
}

impl MaxMindGeoLocator {
    /// Opens the database at `path`, or builds a disabled locator for `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read as an MMDB database.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let reader = match path {
            Some(path) => {
                let reader = Reader::open_readfile(path)
                    .with_context(|| format!("Failed to open GeoIP database at {}", path))?;
                Some(Arc::new(reader))
            }
            None => None,
        };

        Ok(Self { reader })
    }

    pub fn disabled() -> Self {
        Self { reader: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.reader.is_some()
    }

    fn lookup_addr(
        reader: &Reader<Vec<u8>>,
        ip: IpAddr,
    ) -> Result<GeoLocation, EnrichmentError> {
        let result = reader
            .lookup(ip)
            .map_err(|e| EnrichmentError::Lookup(e.to_string()))?;

        let city = result
            .decode::<geoip2::City>()
            .map_err(|e| EnrichmentError::Lookup(e.to_string()))?;

        let Some(city) = city else {
            return Ok(GeoLocation::default());
        };

        Ok(GeoLocation {
            country: city.country.iso_code.map(str::to_string).unwrap_or_default(),
            region: city
                .subdivisions
                .first()
                .and_then(|s| s.names.english)
                .map(str::to_string)
                .unwrap_or_default(),
            city: city
                .city
                .names
                .english
                .map(str::to_string)
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl GeoLocator for MaxMindGeoLocator {
    async fn lookup(&self, ip: &str) -> Result<GeoLocation, EnrichmentError> {
        let Some(reader) = self.reader.as_deref() else {
            return Ok(GeoLocation::default());
        };

        let Ok(addr) = ip.parse::<IpAddr>() else {
            return Ok(GeoLocation::default());
        };

        Self::lookup_addr(reader, addr)
    }
}
