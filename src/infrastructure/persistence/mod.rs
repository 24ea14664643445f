//! PostgreSQL repository implementations.
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through private
//! `FromRow` row structs. Dynamic fragments (sort columns, grouping columns) only
//! ever come from closed enums.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - short links, counters and portfolio aggregates
//! - [`PgClickRepository`] - click events and per-link aggregates
//! - [`PgUserRepository`] - accounts and API keys

pub mod pg_click_repository;
pub mod pg_link_repository;
pub mod pg_user_repository;

pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_user_repository::PgUserRepository;
