//! REST API layer for HTTP request/response handling.
//!
//! Translates HTTP requests into service calls and formats responses.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies and query strings
//! - [`extract`] - Extractors with JSON rejections
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication, rate limiting and tracing
//! - [`routes`] - Route composition for `/api/v1`

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
