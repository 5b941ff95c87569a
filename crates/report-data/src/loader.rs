//! CSV loading for the shooting-incident report.
//!
//! Reads the published CSV from an `http(s)://` URL or a local path into a
//! [`Table`] of text columns. Column names and row count match the source
//! exactly; no types are inferred here.

use std::io::Read;
use std::path::Path;

use report_core::error::{ReportError, Result};
use report_core::table::{Column, ColumnData, Table};
use tracing::{debug, info};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load `source`, fetching it over HTTP when it looks like a URL and reading
/// it from disk otherwise. One read per call; nothing is cached.
pub fn load_table(source: &str) -> Result<Table> {
    let started = std::time::Instant::now();
    let table = if is_url(source) {
        fetch_url(source)?
    } else {
        read_file(Path::new(source))?
    };
    info!(
        "Loaded {} rows x {} columns from {} in {:.2}s",
        table.row_count(),
        table.column_count(),
        source,
        started.elapsed().as_secs_f64()
    );
    Ok(table)
}

/// Parse CSV text from any reader. `origin` names the source in errors.
///
/// The first record is the header. Blank or whitespace-only cells load as
/// absent. A record whose field count differs from the header is an error.
pub fn parse_csv<R: Read>(reader: R, origin: &str) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| unavailable(origin, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.is_empty() {
        return Err(unavailable(origin, "no header row"));
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in csv_reader.records() {
        let record = record.map_err(|e| unavailable(origin, e))?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(non_blank(field));
        }
    }

    debug!(
        "Parsed {} records with {} columns from {}",
        cells.first().map_or(0, Vec::len),
        headers.len(),
        origin
    );

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, ColumnData::Text(values)))
        .collect();
    Table::new(columns).map_err(|e| unavailable(origin, e))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_url(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn fetch_url(url: &str) -> Result<Table> {
    debug!("Fetching {}", url);
    let response = ureq::get(url)
        .set("Accept", "text/csv")
        .set("User-Agent", "shooting-report")
        .call()
        .map_err(|e| unavailable(url, e))?;
    parse_csv(response.into_reader(), url)
}

fn read_file(path: &Path) -> Result<Table> {
    let origin = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| unavailable(&origin, e))?;
    parse_csv(std::io::BufReader::new(file), &origin)
}

fn non_blank(field: &str) -> Option<String> {
    if field.trim().is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

fn unavailable(origin: &str, reason: impl std::fmt::Display) -> ReportError {
    ReportError::DataUnavailable {
        source_name: origin.to_string(),
        reason: reason.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
