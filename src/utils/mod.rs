//! Helpers shared across layers.
//!
//! - [`code_generator`] - short code generation and alias validation
//! - [`destination`] - destination URL validation
//! - [`password`] - Argon2 hashing
//! - [`api_key`] - API key generation and HMAC hashing
//! - [`client_ip`] - client IP resolution behind optional proxies
//! - [`qr`] - QR code rendering

pub mod api_key;
pub mod client_ip;
pub mod code_generator;
pub mod destination;
pub mod password;
pub mod qr;
