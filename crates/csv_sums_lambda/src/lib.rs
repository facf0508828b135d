//! AWS-oriented adapters and handlers for storage-triggered column sums.
//!
//! This crate owns runtime integration details (the Lambda handler, the
//! object-store seam and event dispatch) on top of `csv_sums_core`.

pub mod adapters;
pub mod handlers;
