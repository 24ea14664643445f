//! Response shape of `GET /health`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// One entry per dependency the redirect path relies on.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: ComponentCheck,
    pub click_queue: ComponentCheck,
}

impl HealthChecks {
    pub fn all_ok(&self) -> bool {
        [&self.database, &self.click_queue]
            .iter()
            .all(|c| c.status == ComponentStatus::Ok)
    }
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
}

impl ComponentCheck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Error,
            message: message.into(),
        }
    }
}
