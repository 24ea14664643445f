use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url_shortener_analytics::config::{self, LogFormat};
use url_shortener_analytics::server;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;

    init_tracing(&config.server.log_level, config.server.log_format);
    config.print_summary();

    server::run(config).await
}

/// `RUST_LOG` wins over the configured level when both are set.
fn init_tracing(log_level: &str, log_format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}
