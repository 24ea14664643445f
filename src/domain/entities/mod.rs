//! Core domain entities.
//!
//! Entities are plain data structures. Creation inputs live next to them as
//! `New*` structs and partial updates as `*Patch`.
//!
//! - [`ShortLink`] - a shortened URL with access policy and counters
//! - [`Click`] - one recorded visit
//! - [`User`] - an account owning links
//! - [`analytics`] - report projections that are never persisted

pub mod analytics;
pub mod click;
pub mod short_link;
pub mod user;

pub use analytics::{
    DailyCount, DashboardSummary, GroupedCount, LinkAnalytics, Period, UserDashboard,
};
pub use click::{Click, NewClick};
pub use short_link::{NewShortLink, ShortLink, ShortLinkPatch};
pub use user::{NewUser, User};

#[cfg(test)]
pub(crate) use short_link::sample_link;
