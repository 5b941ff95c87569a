//! Shared types for the shooting-incident report.
//!
//! Holds the columnar table model, grouping values and result records, the
//! dataset's column schema, date/time parsing, the OLS line fit, number
//! formatting and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod regression;
pub mod schema;
pub mod settings;
pub mod table;
pub mod time_utils;

pub use error::{ReportError, Result};
