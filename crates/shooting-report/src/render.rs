//! Plain-text rendering of a [`ReportResult`].
//!
//! Tables are aligned on display width so labels with non-ASCII characters
//! still line up.

use std::fmt::Write as _;

use report_core::formatting::{format_count, format_number, format_percent};
use report_core::models::{GroupedCount, Value};
use report_data::analysis::ReportResult;
use unicode_width::UnicodeWidthStr;

/// Column alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// A simple bordered text table.
struct TextTable {
    headers: Vec<(&'static str, Align)>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new(headers: Vec<(&'static str, Align)>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, (header, _))| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|cell| cell.width())
                    .chain(std::iter::once(header.width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header_cells: Vec<String> = self.headers.iter().map(|(h, _)| h.to_string()).collect();
        out.push_str(&self.line(&header_cells, &widths));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&rule.join("-+-"));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&self.line(row, &widths));
        }
        out
    }

    fn line(&self, cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                let cell = cells.get(i).map_or("", String::as_str);
                let pad = " ".repeat(width.saturating_sub(cell.width()));
                match self.headers[i].1 {
                    Align::Left => format!("{cell}{pad}"),
                    Align::Right => format!("{pad}{cell}"),
                }
            })
            .collect();
        let mut line = padded.join(" | ").trim_end().to_string();
        line.push('\n');
        line
    }
}

/// Render every section of the report as aligned text tables.
pub fn render_text(result: &ReportResult) -> String {
    let mut out = String::new();
    let meta = &result.metadata;

    let _ = writeln!(out, "NYC shooting incidents: {}", meta.source);
    let _ = writeln!(
        out,
        "{} rows loaded, {} retained ({})\n",
        format_count(meta.rows_loaded as u64),
        format_count(meta.rows_retained as u64),
        meta.generated_at
    );

    section(&mut out, "Incidents per year", &grouped(&["Year"], &result.yearly));
    section(
        &mut out,
        "Incidents per borough and year",
        &grouped(&["Borough", "Year"], &result.borough_yearly),
    );

    let mut murders = TextTable::new(vec![
        ("Borough", Align::Left),
        ("Incidents", Align::Right),
        ("Murders", Align::Right),
        ("Murder %", Align::Right),
    ]);
    for rate in &result.murder_rates {
        murders.push(vec![
            rate.borough.clone().unwrap_or_else(|| Value::Missing.to_string()),
            format_count(rate.total),
            format_count(rate.murder_count),
            format_percent(rate.murder_percentage, 1),
        ]);
    }
    section(&mut out, "Murder share by borough", &murders.render());

    let mut hourly = TextTable::new(vec![("Hour", Align::Right), ("Incidents", Align::Right)]);
    for h in &result.hourly {
        hourly.push(vec![format!("{:02}", h.hour), format_count(h.count)]);
    }
    section(&mut out, "Incidents per hour of day", &hourly.render());

    section(
        &mut out,
        "Incidents per jurisdiction",
        &grouped(&["Jurisdiction"], &result.jurisdiction),
    );

    let quality = &result.data_quality;
    match &result.trend {
        Some(trend) => {
            let mut fitted = TextTable::new(vec![
                ("Hour", Align::Right),
                ("Observed", Align::Right),
                ("Predicted", Align::Right),
            ]);
            for p in &trend.points {
                fitted.push(vec![
                    format!("{:02}", p.hour),
                    format_count(p.observed),
                    format_number(p.predicted, 1),
                ]);
            }
            let summary = format!(
                "count = {} + {} * hour  (r² = {}, r = {}, n = {})\n\n{}",
                format_number(trend.fit.intercept, 2),
                format_number(trend.fit.slope, 2),
                format_number(trend.fit.r_squared, 3),
                format_number(trend.fit.correlation, 3),
                trend.fit.n_observations,
                fitted.render()
            );
            section(
                &mut out,
                &format!("Hourly trend, hours {}-{}", trend.first_hour, trend.last_hour),
                &summary,
            );
        }
        None => {
            let reason = quality.trend_unavailable.as_deref().unwrap_or("no hours in window");
            section(&mut out, "Hourly trend", &format!("not fitted: {reason}\n"));
        }
    }

    let mut missing = TextTable::new(vec![("Column", Align::Left), ("Missing", Align::Right)]);
    for c in &quality.missing_by_column {
        missing.push(vec![c.column.clone(), format_count(c.missing as u64)]);
    }
    let quality_text = format!(
        "{} malformed timestamps, {} rows excluded, {} rows without jurisdiction\n\n{}",
        quality.malformed_timestamps.len(),
        format_count(meta.rows_loaded.saturating_sub(meta.rows_retained) as u64),
        quality.missing_jurisdiction.len(),
        missing.render()
    );
    section(&mut out, "Data quality", &quality_text);

    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.width()));
    let _ = writeln!(out, "{body}");
}

/// Key columns followed by a right-aligned count column.
fn grouped(key_headers: &[&'static str], counts: &[GroupedCount]) -> String {
    let mut headers: Vec<(&'static str, Align)> =
        key_headers.iter().map(|h| (*h, Align::Left)).collect();
    headers.push(("Incidents", Align::Right));

    let mut table = TextTable::new(headers);
    for group in counts {
        let mut row: Vec<String> = group.key.iter().map(|v| v.to_string()).collect();
        row.push(format_count(group.count));
        table.push(row);
    }
    table.render()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
