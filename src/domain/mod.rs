//! Domain layer: entities, repository contracts and the click pipeline.
//!
//! # Architecture
//!
//! - [`entities`] - core business data structures
//! - [`repositories`] - data access trait definitions
//! - [`enrichment`] - GeoIP and user-agent contracts
//! - [`click_event`] - request signals handed to the recorder
//! - [`click_worker`] - background enrichment and persistence of clicks
//!
//! # Click Processing Flow
//!
//! 1. The redirect service authorises a short code
//! 2. A [`click_event::ClickEvent`] is pushed onto a bounded channel
//! 3. [`click_worker::run_click_worker`] hands it to a [`click_worker::ClickRecorder`]
//! 4. The recorder increments the link counter, enriches and stores the click

pub mod click_event;
pub mod click_worker;
pub mod enrichment;
pub mod entities;
pub mod repositories;
