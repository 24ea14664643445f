//! Data Transfer Objects for API requests and responses.
//!
//! Requests derive `Deserialize` and, where they carry user input, `Validate`.
//! Responses are built from domain values through `From` impls.

pub mod analytics;
pub mod auth;
pub mod health;
pub mod links;
pub mod pagination;
pub mod redirect;
