//! Application layer
//!
//! Orchestrates the domain logic: the extractor cascade that turns a page
//! into a verdict, and the monitor loop that drives checks and alerts.

pub mod monitor;
pub mod resolver;

pub use monitor::{CheckOutcome, CycleReport, RestockMonitor};
pub use resolver::{AvailabilityResolver, merge_verdicts};
