//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, migrations, enrichment adapters, the click
//! worker and the Axum server lifecycle.

use crate::config::Config;
use crate::domain::click_worker::{ClickRecorder, run_click_worker};
use crate::domain::repositories::{ClickRepository, LinkRepository, UserRepository};
use crate::infrastructure::enrichment::{MaxMindGeoLocator, WootheeParser};
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository, PgUserRepository};
use crate::routes::app_router;
use crate::state::{AppState, Repositories, StateOptions};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Migrations
/// - GeoIP database (optional)
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// On shutdown the click queue is closed and the worker finishes in-flight
/// recordings before this function returns.
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, the
/// GeoIP file is unreadable, or the listener cannot bind.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .idle_timeout(config.database.idle_timeout)
        .max_lifetime(config.database.max_lifetime)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let geo_locator = MaxMindGeoLocator::open(config.geoip.db_path.as_deref())?;
    if geo_locator.is_enabled() {
        tracing::info!("GeoIP enabled");
    } else {
        tracing::info!("GeoIP disabled (GEOIP_DB_PATH not set)");
    }

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository: Arc<dyn ClickRepository> =
        Arc::new(PgClickRepository::new(pool.clone()));
    let user_repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));

    let (click_tx, click_rx) = mpsc::channel(config.clicks.queue_capacity);

    let recorder = Arc::new(ClickRecorder::new(
        link_repository.clone(),
        click_repository.clone(),
        Arc::new(geo_locator),
        Arc::new(WootheeParser),
        config.geoip.timeout,
    ));
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        recorder,
        config.clicks.worker_concurrency,
    ));
    tracing::info!(
        concurrency = config.clicks.worker_concurrency,
        "Click worker started"
    );

    let state = AppState::new(
        Repositories {
            links: link_repository,
            clicks: click_repository,
            users: user_repository,
        },
        StateOptions::from(&config),
        click_tx,
    );

    let app = NormalizePathLayer::trim_trailing_slash().layer(app_router(state));

    let addr: SocketAddr = config.server.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The server owned the last click sender; dropping it closed the queue.
    tracing::info!("Draining click queue");
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Click worker panicked");
    }

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
