//! Infrastructure layer for external integrations.
//!
//! Implements the contracts defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`enrichment`] - GeoIP and user-agent adapters

pub mod enrichment;
pub mod persistence;
