//! Rate limiting middleware using the token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

type PeerRateLimit =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for the authenticated API.
///
/// # Limits
///
/// - **Rate**: 10 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
/// Keys are the socket peer address.
pub fn layer() -> PeerRateLimit {
    peer_limit(10, 100)
}

/// Stricter limiter for credential checks: register, login, refresh and
/// link password unlock.
///
/// # Limits
///
/// - **Rate**: 1 request per second
/// - **Burst**: 10 requests
pub fn secure_layer() -> PeerRateLimit {
    peer_limit(1, 10)
}

fn peer_limit(per_second: u64, burst_size: u32) -> PeerRateLimit {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(per_second)
            .burst_size(burst_size)
            .finish()
            .expect("rate limit period and burst are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}
