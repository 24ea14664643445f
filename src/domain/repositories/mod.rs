//! Repository trait definitions for the domain layer.
//!
//! Traits define the data access contract; PostgreSQL implementations live in
//! `crate::infrastructure::persistence`. Mocks are generated with `mockall`
//! for unit tests, and `tests/common` provides in-memory fakes for
//! end-to-end tests.
//!
//! - [`LinkRepository`] - short links, counters and portfolio aggregates
//! - [`ClickRepository`] - click events and per-link aggregates
//! - [`UserRepository`] - accounts and API keys

pub mod click_repository;
pub mod link_repository;
pub mod user_repository;

pub use click_repository::{ClickDimension, ClickRepository};
pub use link_repository::{LinkListQuery, LinkRepository, LinkSortField, SortOrder};
pub use user_repository::UserRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
