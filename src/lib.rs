//! Restock Monitor - product availability detection and restock alerts
//!
//! Polls retail product pages, extracts a layered availability signal from
//! each one and sends a single alert whenever a product comes back in stock.
//!
//! - [`domain`]: identifiers, verdicts and the alert state machine
//! - [`infrastructure`]: fetching, signal extraction, notification, config, logging
//! - [`application`]: the extractor cascade and the polling loop

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use application::{AvailabilityResolver, CheckOutcome, CycleReport, RestockMonitor};
pub use domain::{Availability, AvailabilityVerdict, CanonicalId, ProductReference};
pub use infrastructure::AppConfig;
