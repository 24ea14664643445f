//! `GET /health`: liveness of the database and the click pipeline.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{ComponentCheck, HealthChecks, HealthResponse, ServiceStatus};
use crate::state::AppState;

/// Reports whether redirects can be served and clicks recorded.
///
/// Answers **200** when every check passes and **503** otherwise, with the same
/// body shape either way:
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "click_queue": { "status": "ok", "message": "Free slots: 10000/10000" }
///   }
/// }
/// ```
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = HealthChecks {
        database: database_check(&state).await,
        click_queue: click_queue_check(&state),
    };

    let (code, status) = if checks.all_ok() {
        (StatusCode::OK, ServiceStatus::Healthy)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ServiceStatus::Degraded)
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks,
        }),
    )
}

async fn database_check(state: &AppState) -> ComponentCheck {
    match state.link_repository.ping().await {
        Ok(()) => ComponentCheck::ok("Connected"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            ComponentCheck::error(format!("Database error: {e}"))
        }
    }
}

/// A closed queue means the click worker has exited.
fn click_queue_check(state: &AppState) -> ComponentCheck {
    let sender = &state.click_sender;

    if sender.is_closed() {
        return ComponentCheck::error("Click queue is closed");
    }

    ComponentCheck::ok(format!(
        "Free slots: {}/{}",
        sender.capacity(),
        sender.max_capacity()
    ))
}
