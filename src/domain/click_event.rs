//! Click event passed from the redirect path to the background recorder.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Raw request signals for one authorised redirect.
///
/// Built by the redirect service once access policy has passed, sent over a
/// bounded channel and turned into a [`crate::domain::entities::NewClick`]
/// by [`crate::domain::click_worker::ClickRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub url_id: Uuid,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub clicked_at: DateTime<Utc>,
}

/// Request signals captured by the HTTP layer before the link is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl ClickContext {
    pub fn new(ip: Option<String>, user_agent: Option<&str>, referer: Option<&str>) -> Self {
        Self {
            ip,
            user_agent: user_agent.filter(|s| !s.is_empty()).map(str::to_string),
            referer: referer.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }
}

impl ClickEvent {
    /// Stamps a context with the resolved link and the current time.
    pub fn new(url_id: Uuid, context: ClickContext) -> Self {
        Self {
            url_id,
            ip: context.ip,
            user_agent: context.user_agent,
            referer: context.referer,
            clicked_at: Utc::now(),
        }
    }
}
