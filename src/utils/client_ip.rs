//! Client IP resolution for click recording.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Resolves the client IP.
///
/// Forwarding headers are trusted only when `behind_proxy` is set, in which case the
/// first `X-Forwarded-For` entry wins, then `X-Real-IP`. Otherwise the socket peer is used.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }

        if let Some(real_ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return real_ip.to_string();
        }
    }

    peer.ip().to_string()
}
