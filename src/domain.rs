//! Domain module - Core availability and alerting logic
//!
//! This module contains the value types that flow through one product
//! check and the alert state machine that survives across cycles.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod alert;
pub mod availability;
pub mod constants;
pub mod product;

// Re-export commonly used items for convenience
pub use alert::{AlertAction, AlertRecord, AlertState, AlertStore, AlertTransition, transition};
pub use availability::{Availability, AvailabilityVerdict, Confidence, ExtractorResult};
pub use product::{CanonicalId, ProductReference};
