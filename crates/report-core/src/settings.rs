use clap::Parser;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::{ReportError, Result};
use crate::schema::DEFAULT_SOURCE_URL;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// NYC shooting-incident report: counts by year, borough and hour, plus an
/// hourly trend fit
#[derive(Parser, Debug, Clone)]
#[command(
    name = "shooting-report",
    about = "NYC shooting-incident counts and hourly trend",
    version
)]
pub struct Settings {
    /// CSV source: an http(s) URL or a local file path
    #[arg(long, env = "SHOOTING_REPORT_SOURCE", default_value = DEFAULT_SOURCE_URL)]
    pub source: String,

    /// First hour of the trend window (0-23)
    #[arg(long, default_value = "9", value_parser = clap::value_parser!(u32).range(0..=23))]
    pub hour_start: u32,

    /// Last hour of the trend window, inclusive (0-23)
    #[arg(long, default_value = "23", value_parser = clap::value_parser!(u32).range(0..=23))]
    pub hour_end: u32,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Abort on the first malformed timestamp instead of reporting it
    #[arg(long)]
    pub strict: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments, apply `--debug` and validate.
    ///
    /// `--help`, `--version` and argument errors exit the process the way
    /// clap normally does.
    pub fn load() -> Result<Self> {
        Settings::parse().finish()
    }

    /// Same as [`Settings::load`] over an explicit argument list, returning
    /// argument errors instead of exiting.
    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args)
            .map_err(|e| ReportError::Config(e.to_string()))?
            .finish()
    }

    fn finish(mut self) -> Result<Self> {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self.validate()?;
        Ok(self)
    }

    /// Check cross-field constraints clap cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.hour_start >= self.hour_end {
            return Err(ReportError::Config(format!(
                "hour window {}..={} must span at least two hours",
                self.hour_start, self.hour_end
            )));
        }
        if self.source.trim().is_empty() {
            return Err(ReportError::Config("source must not be empty".to_string()));
        }
        Ok(())
    }

    /// Hours included in the trend fit.
    pub fn hour_range(&self) -> RangeInclusive<u32> {
        self.hour_start..=self.hour_end
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
