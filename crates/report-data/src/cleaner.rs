//! Column pruning, type coercion and missing-value handling.
//!
//! Every operation takes the table by reference and returns a new one; the
//! caller's table is never modified.

use report_core::error::{ReportError, Result};
use report_core::models::{
    ColumnMissing, IncidentRecord, MalformedTimestamp, MissingRequiredField, Value,
};
use report_core::schema::{self, DEMOGRAPHIC_AND_LOCATION_COLUMNS};
use report_core::table::{Categorical, Column, ColumnData, ColumnKind, Table};
use report_core::time_utils::{format_date, parse_date, parse_date_time};
use tracing::{debug, warn};

/// Remove the victim/suspect demographic and geocoordinate columns.
///
/// Row count and the order of the remaining columns are unchanged. Columns
/// already absent are ignored, so applying this twice equals applying it
/// once.
pub fn drop_demographic_and_location_columns(table: &Table) -> Table {
    let dropped = table.without_columns(DEMOGRAPHIC_AND_LOCATION_COLUMNS);
    debug!(
        "Dropped {} demographic/location columns",
        table.column_count() - dropped.column_count()
    );
    dropped
}

/// Type `OCCUR_DATE` as a date and add `OCCUR_DATETIME`.
///
/// Cells that do not match `MM/DD/YYYY` (date) or `MM/DD/YYYY HH:MM:SS[.f]`
/// (date + time) are left absent and reported; the table is still returned.
/// Absent source cells produce absent results without a report.
pub fn parse_datetime(table: &Table) -> Result<(Table, Vec<MalformedTimestamp>)> {
    let dates = table.column(schema::OCCUR_DATE)?;
    let times = table.column(schema::OCCUR_TIME)?;
    ensure_textual(schema::OCCUR_TIME, times)?;

    let mut parsed_dates = Vec::with_capacity(table.row_count());
    let mut parsed_date_times = Vec::with_capacity(table.row_count());
    let mut malformed = Vec::new();

    for row in 0..table.row_count() {
        let date_text = match dates.value(row) {
            Value::Missing => None,
            Value::Text(s) => Some(s),
            Value::Date(d) => Some(format_date(d)),
            _ => {
                return Err(ReportError::ColumnType {
                    column: schema::OCCUR_DATE.to_string(),
                    expected: ColumnKind::Text.to_string(),
                    actual: dates.kind().to_string(),
                })
            }
        };
        let time_text = times.value(row).as_text().map(str::to_string);

        let date = date_text.as_deref().and_then(parse_date);
        if let (Some(raw), None) = (&date_text, date) {
            malformed.push(MalformedTimestamp {
                row,
                column: schema::OCCUR_DATE.to_string(),
                value: raw.clone(),
            });
        }

        let date_time = match (date, &date_text, &time_text) {
            (Some(_), Some(d), Some(t)) => {
                let dt = parse_date_time(d, t);
                if dt.is_none() {
                    malformed.push(MalformedTimestamp {
                        row,
                        column: schema::OCCUR_TIME.to_string(),
                        value: t.clone(),
                    });
                }
                dt
            }
            _ => None,
        };

        parsed_dates.push(date);
        parsed_date_times.push(date_time);
    }

    for m in &malformed {
        warn!("Malformed {} in row {}: {:?}", m.column, m.row, m.value);
    }

    let typed = table
        .with_column(Column::new(schema::OCCUR_DATE, ColumnData::Date(parsed_dates)))?
        .with_column(Column::new(
            schema::OCCUR_DATETIME,
            ColumnData::DateTime(parsed_date_times),
        ))?;
    Ok((typed, malformed))
}

/// Reinterpret each named column as a categorical whose label set is the
/// set of distinct values observed in that column.
///
/// Text and integer columns are accepted; columns already categorical are
/// kept as they are. Absent cells become the missing category.
pub fn coerce_categoricals(table: &Table, columns: &[&str]) -> Result<Table> {
    let mut out = table.clone();
    for &name in columns {
        let categorical = match table.column(name)? {
            ColumnData::Text(values) => {
                Categorical::from_labels(values.iter().map(Option::as_deref))
            }
            ColumnData::Integer(values) => {
                Categorical::from_labels(values.iter().map(|v| v.map(|i| i.to_string())))
            }
            ColumnData::Categorical(c) => c.clone(),
            other => {
                return Err(ReportError::ColumnType {
                    column: name.to_string(),
                    expected: ColumnKind::Text.to_string(),
                    actual: other.kind().to_string(),
                })
            }
        };
        debug!(
            "Coerced {} to categorical with {} categories",
            name,
            categorical.cardinality()
        );
        out = out.with_column(Column::new(name, ColumnData::Categorical(categorical)))?;
    }
    Ok(out)
}

/// Every row whose `column` cell is absent, as typed records.
pub fn find_missing(table: &Table, column: &str) -> Result<Vec<IncidentRecord>> {
    let data = table.column(column)?;
    Ok((0..table.row_count())
        .filter(|&row| data.is_missing(row))
        .map(|row| table.record(row))
        .collect())
}

/// Exclude every row missing any of `columns`.
///
/// Returns the narrowed table plus one entry per (row, column) that caused an
/// exclusion. Row indices refer to the input table. Nothing is imputed.
pub fn drop_missing(
    table: &Table,
    columns: &[&str],
) -> Result<(Table, Vec<MissingRequiredField>)> {
    let data: Vec<(&str, &ColumnData)> = columns
        .iter()
        .map(|&name| table.column(name).map(|c| (name, c)))
        .collect::<Result<_>>()?;

    let mut keep = Vec::with_capacity(table.row_count());
    let mut excluded = Vec::new();
    for row in 0..table.row_count() {
        let before = excluded.len();
        for (name, column) in &data {
            if column.is_missing(row) {
                excluded.push(MissingRequiredField {
                    row,
                    column: (*name).to_string(),
                });
            }
        }
        if excluded.len() == before {
            keep.push(row);
        }
    }

    if !excluded.is_empty() {
        warn!(
            "Excluded {} of {} rows missing one of {:?}",
            table.row_count() - keep.len(),
            table.row_count(),
            columns
        );
    }
    Ok((table.select_rows(&keep), excluded))
}

/// Count of absent cells per column, in column order.
pub fn missing_summary(table: &Table) -> Vec<ColumnMissing> {
    table
        .columns()
        .iter()
        .map(|c| ColumnMissing {
            column: c.name.clone(),
            missing: (0..table.row_count()).filter(|&r| c.data.is_missing(r)).count(),
            rows: table.row_count(),
        })
        .collect()
}

fn ensure_textual(name: &str, data: &ColumnData) -> Result<()> {
    match data.kind() {
        ColumnKind::Text | ColumnKind::Categorical => Ok(()),
        other => Err(ReportError::ColumnType {
            column: name.to_string(),
            expected: ColumnKind::Text.to_string(),
            actual: other.to_string(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
