//! Data pipeline for the shooting-incident report.
//!
//! Loads the published CSV, cleans and retypes it, computes grouped counts
//! and fits the hourly trend.

pub mod aggregator;
pub mod analysis;
pub mod cleaner;
pub mod loader;

pub use report_core as core;
