//! Background click recording.
//!
//! The redirect path only enqueues a [`ClickEvent`]. This module drains the
//! queue, enriches each event and writes it. Nothing here ever reaches the
//! HTTP response: failures are logged, counted and dropped.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::enrichment::{GeoLocation, GeoLocator, UserAgentParser};
use crate::domain::entities::NewClick;
use crate::domain::repositories::{ClickRepository, LinkRepository};

/// What happened to one event. Used by tests and debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub counted: bool,
    pub stored: bool,
}

/// Enriches and persists click events.
///
/// The counter increment and the click insert are independent writes. Either
/// one may fail without undoing the other.
pub struct ClickRecorder<L, C>
where
    L: LinkRepository + ?Sized,
    C: ClickRepository + ?Sized,
{
    link_repository: Arc<L>,
    click_repository: Arc<C>,
    geo_locator: Arc<dyn GeoLocator>,
    ua_parser: Arc<dyn UserAgentParser>,
    geo_timeout: Duration,
}

impl<L, C> ClickRecorder<L, C>
where
    L: LinkRepository + ?Sized,
    C: ClickRepository + ?Sized,
{
    pub fn new(
        link_repository: Arc<L>,
        click_repository: Arc<C>,
        geo_locator: Arc<dyn GeoLocator>,
        ua_parser: Arc<dyn UserAgentParser>,
        geo_timeout: Duration,
    ) -> Self {
        Self {
            link_repository,
            click_repository,
            geo_locator,
            ua_parser,
            geo_timeout,
        }
    }

    /// Records one click.
    ///
    /// # Steps
    ///
    /// 1. Atomic `click_count` increment
    /// 2. GeoIP lookup bounded by the configured timeout
    /// 3. User-agent classification
    /// 4. Click insert
    ///
    /// Every step logs and continues on failure.
    pub async fn record(&self, event: ClickEvent) -> RecordOutcome {
        let url_id = event.url_id;

        let counted = match self.link_repository.increment_click_count(url_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(%url_id, error = %e, "Failed to increment click count");
                counter!("clicks_failed_total", "stage" => "increment").increment(1);
                false
            }
        };

        let location = self.locate(event.ip.as_deref()).await;
        let client = self
            .ua_parser
            .parse(event.user_agent.as_deref().unwrap_or_default());

        let new_click = NewClick {
            url_id,
            ip_address: event.ip.unwrap_or_default(),
            user_agent: event.user_agent.unwrap_or_default(),
            referer: event.referer.unwrap_or_default(),
            country: location.country,
            region: location.region,
            city: location.city,
            browser: client.browser,
            os: client.os,
            device_type: client.device_type,
            is_unique: false,
            clicked_at: event.clicked_at,
        };

        let stored = match self.click_repository.store(new_click).await {
            Ok(click) => {
                debug!(%url_id, click_id = %click.id, "Click recorded");
                counter!("clicks_recorded_total").increment(1);
                true
            }
            Err(e) => {
                error!(%url_id, error = %e, "Failed to store click");
                counter!("clicks_failed_total", "stage" => "store").increment(1);
                false
            }
        };

        RecordOutcome { counted, stored }
    }

    async fn locate(&self, ip: Option<&str>) -> GeoLocation {
        let Some(ip) = ip.filter(|ip| !ip.is_empty()) else {
            return GeoLocation::default();
        };

        match tokio::time::timeout(self.geo_timeout, self.geo_locator.lookup(ip)).await {
            Ok(Ok(location)) => location,
            Ok(Err(e)) => {
                warn!(ip, error = %e, "GeoIP lookup failed, storing click without location");
                counter!("geoip_failures_total").increment(1);
                GeoLocation::default()
            }
            Err(_) => {
                warn!(ip, timeout_ms = self.geo_timeout.as_millis() as u64, "GeoIP lookup timed out");
                counter!("geoip_failures_total").increment(1);
                GeoLocation::default()
            }
        }
    }
}

/// Drains the click queue until every sender is dropped.
///
/// At most `concurrency` recordings run at once. Once the channel closes the
/// worker waits for in-flight recordings before returning.
pub async fn run_click_worker<L, C>(
    mut rx: mpsc::Receiver<ClickEvent>,
    recorder: Arc<ClickRecorder<L, C>>,
    concurrency: usize,
) where
    L: LinkRepository + ?Sized + 'static,
    C: ClickRepository + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    while let Some(event) = rx.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        let recorder = recorder.clone();
        in_flight.spawn(async move {
            let _permit = permit;
            recorder.record(event).await
        });

        while let Some(finished) = in_flight.try_join_next() {
            if let Err(e) = finished {
                error!(error = %e, "Click recording task panicked");
            }
        }
    }

    while let Some(finished) = in_flight.join_next().await {
        if let Err(e) = finished {
            error!(error = %e, "Click recording task panicked");
        }
    }

    info!("Click worker stopped");
}
