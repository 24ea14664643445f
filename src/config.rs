//! Startup configuration, read from the environment once and grouped by concern.
//!
//! [`load_from_env`] reads every section and validates the result. Nothing reads
//! the environment afterwards.
//!
//! ## Database
//!
//! `DATABASE_URL`, or `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`
//! when the URL is absent. Pool tuning: `DB_MAX_CONNECTIONS` (10),
//! `DB_CONNECT_TIMEOUT` (30s), `DB_IDLE_TIMEOUT` (600s), `DB_MAX_LIFETIME` (1800s).
//!
//! ## Auth (required)
//!
//! - `JWT_SECRET`, `JWT_REFRESH_SECRET` - HS256 signing secrets, must differ
//! - `API_KEY_SIGNING_SECRET` - HMAC key for stored API key hashes
//! - `ACCESS_TOKEN_TTL_SECONDS` (900), `REFRESH_TOKEN_TTL_SECONDS` (604800),
//!   `UNLOCK_TOKEN_TTL_SECONDS` (60)
//!
//! ## Server
//!
//! - `LISTEN` (`0.0.0.0:3000`), `BASE_URL` (`http://localhost:3000`)
//! - `BEHIND_PROXY` - read click IPs from `X-Forwarded-For` / `X-Real-IP`
//! - `RUST_LOG` (`info`), `LOG_FORMAT` (`text` or `json`)
//!
//! ## Clicks and enrichment
//!
//! - `CLICK_QUEUE_CAPACITY` (10000), `CLICK_WORKER_CONCURRENCY` (4)
//! - `GEOIP_DB_PATH` - MaxMind City database; lookups are skipped without it
//! - `GEOIP_TIMEOUT_MS` (200)

use anyhow::{Context, Result, bail, ensure};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::application::services::TokenSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("LOG_FORMAT must be 'text' or 'json', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Public prefix of short URLs, without a trailing slash.
    pub base_url: String,
    /// Trust proxy headers for click IPs. Enable only behind a trusted reverse proxy.
    pub behind_proxy: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub api_key_secret: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    pub unlock_ttl_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct ClickConfig {
    pub queue_capacity: usize,
    pub worker_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct GeoIpConfig {
    pub db_path: Option<String>,
    pub timeout: Duration,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub clicks: ClickConfig,
    pub geoip: GeoIpConfig,
}

impl Config {
    /// Reads every section from the environment without validating it.
    ///
    /// # Errors
    ///
    /// Fails if the database location or a signing secret is missing, or
    /// `LOG_FORMAT` is unknown.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env().context("Failed to load database configuration")?,
            auth: AuthConfig::from_env()?,
            clicks: ClickConfig {
                queue_capacity: parse_or("CLICK_QUEUE_CAPACITY", 10_000),
                worker_concurrency: parse_or("CLICK_WORKER_CONCURRENCY", 4),
            },
            geoip: GeoIpConfig {
                db_path: env::var("GEOIP_DB_PATH")
                    .ok()
                    .filter(|p| !p.trim().is_empty()),
                timeout: Duration::from_millis(parse_or("GEOIP_TIMEOUT_MS", 200)),
            },
        })
    }

    /// Checks cross-field rules and ranges. Reports the first violation.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.clicks.validate()?;

        ensure!(!self.geoip.timeout.is_zero(), "GEOIP_TIMEOUT_MS must be positive");

        Ok(())
    }

    /// Logs the effective configuration. Secrets and the database password are omitted.
    pub fn print_summary(&self) {
        tracing::info!(
            listen = %self.server.listen_addr,
            base_url = %self.server.base_url,
            behind_proxy = self.server.behind_proxy,
            "Server settings"
        );
        tracing::info!(
            url = %mask_connection_string(&self.database.url),
            max_connections = self.database.max_connections,
            "Database settings"
        );
        tracing::info!(
            queue_capacity = self.clicks.queue_capacity,
            worker_concurrency = self.clicks.worker_concurrency,
            "Click pipeline settings"
        );

        match &self.geoip.db_path {
            Some(path) => tracing::info!(
                path = %path,
                timeout_ms = self.geoip.timeout.as_millis() as u64,
                "GeoIP enabled"
            ),
            None => tracing::info!("GeoIP disabled"),
        }
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        Ok(Self {
            listen_addr: env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            base_url: base_url.trim_end_matches('/').to_string(),
            behind_proxy: env::var("BEHIND_PROXY")
                .is_ok_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            log_format: env::var("LOG_FORMAT")
                .map(|v| v.parse())
                .unwrap_or(Ok(LogFormat::Text))?,
        })
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.listen_addr.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()),
            "LISTEN must look like 'host:port', got '{}'",
            self.listen_addr
        );

        let base = Url::parse(&self.base_url)
            .with_context(|| format!("BASE_URL is not a valid URL: '{}'", self.base_url))?;
        ensure!(
            matches!(base.scheme(), "http" | "https"),
            "BASE_URL must use http or https, got '{}'",
            self.base_url
        );

        Ok(())
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: Self::resolve_url()?,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            acquire_timeout: Duration::from_secs(parse_or("DB_CONNECT_TIMEOUT", 30)),
            idle_timeout: Duration::from_secs(parse_or("DB_IDLE_TIMEOUT", 600)),
            max_lifetime: Duration::from_secs(parse_or("DB_MAX_LIFETIME", 1800)),
        })
    }

    /// `DATABASE_URL` wins. Otherwise the URL is assembled from `DB_*` parts,
    /// of which user, password and name are mandatory.
    fn resolve_url() -> Result<String> {
        if let Ok(url) = env::var("DATABASE_URL") {
            return Ok(url);
        }

        let part = |name: &str| {
            env::var(name).with_context(|| format!("{name} is required without DATABASE_URL"))
        };

        let host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".into());
        let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
        let user = part("DB_USER")?;
        let password = part("DB_PASSWORD")?;
        let name = part("DB_NAME")?;

        Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.url.starts_with("postgres://") || self.url.starts_with("postgresql://"),
            "DATABASE_URL must be a postgres:// URL, got '{}'",
            mask_connection_string(&self.url)
        );
        ensure!(self.max_connections > 0, "DB_MAX_CONNECTIONS must be at least 1");
        ensure!(
            !self.acquire_timeout.is_zero(),
            "DB_CONNECT_TIMEOUT must be positive"
        );
        Ok(())
    }
}

impl AuthConfig {
    fn from_env() -> Result<Self> {
        let secret = |name: &str| env::var(name).with_context(|| format!("{name} must be set"));

        Ok(Self {
            access_secret: secret("JWT_SECRET")?,
            refresh_secret: secret("JWT_REFRESH_SECRET")?,
            api_key_secret: secret("API_KEY_SIGNING_SECRET")?,
            access_ttl_seconds: parse_or("ACCESS_TOKEN_TTL_SECONDS", 900),
            refresh_ttl_seconds: parse_or("REFRESH_TOKEN_TTL_SECONDS", 604_800),
            unlock_ttl_seconds: parse_or("UNLOCK_TOKEN_TTL_SECONDS", 60),
        })
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("JWT_SECRET", &self.access_secret),
            ("JWT_REFRESH_SECRET", &self.refresh_secret),
            ("API_KEY_SIGNING_SECRET", &self.api_key_secret),
        ] {
            ensure!(!value.is_empty(), "{name} must not be empty");
        }
        ensure!(
            self.access_secret != self.refresh_secret,
            "JWT_SECRET and JWT_REFRESH_SECRET must differ"
        );

        for (name, ttl) in [
            ("ACCESS_TOKEN_TTL_SECONDS", self.access_ttl_seconds),
            ("REFRESH_TOKEN_TTL_SECONDS", self.refresh_ttl_seconds),
            ("UNLOCK_TOKEN_TTL_SECONDS", self.unlock_ttl_seconds),
        ] {
            ensure!(ttl > 0, "{name} must be positive, got {ttl}");
        }
        Ok(())
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: self.access_secret.clone(),
            refresh_secret: self.refresh_secret.clone(),
            access_ttl_seconds: self.access_ttl_seconds,
            refresh_ttl_seconds: self.refresh_ttl_seconds,
            unlock_ttl_seconds: self.unlock_ttl_seconds,
        }
    }
}

impl ClickConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            (100..=1_000_000).contains(&self.queue_capacity),
            "CLICK_QUEUE_CAPACITY must be within 100..=1000000, got {}",
            self.queue_capacity
        );
        ensure!(
            (1..=256).contains(&self.worker_concurrency),
            "CLICK_WORKER_CONCURRENCY must be within 1..=256, got {}",
            self.worker_concurrency
        );
        Ok(())
    }
}

/// Unset or unparseable values fall back to `default`.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Replaces the password of a connection URL with `***` for logging.
fn mask_connection_string(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_ok() {
                url.to_string()
            } else {
                raw.to_string()
            }
        }
        _ => raw.to_string(),
    }
}

/// Reads and validates the configuration.
///
/// `.env` must already be loaded (`dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn sample() -> Config {
        Config {
            server: ServerConfig {
                listen_addr: "0.0.0.0:3000".to_string(),
                base_url: "https://sho.rt".to_string(),
                behind_proxy: false,
                log_level: "info".to_string(),
                log_format: LogFormat::Text,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 10,
                acquire_timeout: Duration::from_secs(30),
                idle_timeout: Duration::from_secs(600),
                max_lifetime: Duration::from_secs(1800),
            },
            auth: AuthConfig {
                access_secret: "access".to_string(),
                refresh_secret: "refresh".to_string(),
                api_key_secret: "keys".to_string(),
                access_ttl_seconds: 900,
                refresh_ttl_seconds: 604_800,
                unlock_ttl_seconds: 60,
            },
            clicks: ClickConfig {
                queue_capacity: 10_000,
                worker_concurrency: 4,
            },
            geoip: GeoIpConfig {
                db_path: None,
                timeout: Duration::from_millis(200),
            },
        }
    }

    /// Removes every variable these tests touch.
    fn clear_env() {
        // SAFETY: callers are #[serial], nothing else touches the environment concurrently.
        unsafe {
            for name in [
                "DATABASE_URL",
                "DB_HOST",
                "DB_PORT",
                "DB_USER",
                "DB_PASSWORD",
                "DB_NAME",
                "JWT_SECRET",
                "JWT_REFRESH_SECRET",
                "API_KEY_SIGNING_SECRET",
                "CLICK_QUEUE_CAPACITY",
                "GEOIP_DB_PATH",
                "BEHIND_PROXY",
                "LOG_FORMAT",
                "BASE_URL",
            ] {
                env::remove_var(name);
            }
        }
    }

    fn set_required() {
        // SAFETY: callers are #[serial].
        unsafe {
            env::set_var("DATABASE_URL", "postgres://u:p@localhost/db");
            env::set_var("JWT_SECRET", "a");
            env::set_var("JWT_REFRESH_SECRET", "b");
            env::set_var("API_KEY_SIGNING_SECRET", "c");
        }
    }

    #[test]
    fn test_password_is_masked() {
        assert_eq!(
            mask_connection_string("postgres://shortener:hunter2@db:5432/links"),
            "postgres://shortener:***@db:5432/links"
        );
        assert_eq!(
            mask_connection_string("postgres://db:5432/links"),
            "postgres://db:5432/links"
        );
    }

    #[test]
    fn test_sample_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_server_rules() {
        let mut config = sample();
        config.server.listen_addr = "3000".to_string();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.server.base_url = "ftp://sho.rt".to_string();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.database.url = "mysql://localhost/test".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_click_pipeline_bounds() {
        let mut config = sample();
        config.clicks.queue_capacity = 50;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.clicks.worker_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_rules() {
        let mut config = sample();
        config.auth.refresh_secret = config.auth.access_secret.clone();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.auth.api_key_secret.clear();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.auth.unlock_ttl_seconds = 0;
        assert!(config.validate().is_err());

        let settings = sample().auth.token_settings();
        assert_eq!(settings.access_secret, "access");
        assert_eq!(settings.unlock_ttl_seconds, 60);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    #[serial]
    fn test_database_url_from_parts() {
        clear_env();
        // SAFETY: #[serial].
        unsafe {
            env::set_var("DB_HOST", "pg");
            env::set_var("DB_USER", "app");
            env::set_var("DB_PASSWORD", "pw");
            env::set_var("DB_NAME", "links");
        }

        assert_eq!(
            DatabaseConfig::resolve_url().unwrap(),
            "postgres://app:pw@pg:5432/links"
        );

        // SAFETY: #[serial].
        unsafe {
            env::set_var("DATABASE_URL", "postgres://direct@pg/links");
        }
        assert_eq!(
            DatabaseConfig::resolve_url().unwrap(),
            "postgres://direct@pg/links"
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        set_required();
        // SAFETY: #[serial].
        unsafe {
            env::set_var("BEHIND_PROXY", "TRUE");
            env::set_var("BASE_URL", "https://sho.rt/");
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.clicks.queue_capacity, 10_000);
        assert_eq!(config.auth.access_ttl_seconds, 900);
        assert_eq!(config.geoip.timeout, Duration::from_millis(200));
        assert!(config.geoip.db_path.is_none());
        assert!(config.server.behind_proxy);
        assert_eq!(config.server.base_url, "https://sho.rt");
        assert_eq!(config.server.log_format, LogFormat::Text);
        assert!(config.validate().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_secret_fails() {
        clear_env();
        set_required();
        // SAFETY: #[serial].
        unsafe {
            env::remove_var("JWT_REFRESH_SECRET");
        }

        assert!(Config::from_env().is_err());

        clear_env();
    }
}
