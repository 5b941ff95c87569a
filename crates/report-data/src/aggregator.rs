//! Grouped counts over the cleaned incident table.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use report_core::error::{ReportError, Result};
use report_core::formatting::percentage;
use report_core::models::{GroupedCount, HourCount, MurderRate, Value};
use report_core::schema;
use report_core::table::{Column, ColumnData, Table};
use tracing::debug;

// ── IncidentAggregator ────────────────────────────────────────────────────────

/// Stateless helper that partitions incident rows and counts them.
pub struct IncidentAggregator;

impl IncidentAggregator {
    /// Add `OCCUR_YEAR` (from `OCCUR_DATE`) and `OCCUR_HOUR` (from
    /// `OCCUR_DATETIME`) as integer columns.
    ///
    /// Requires [`crate::cleaner::parse_datetime`] to have run. Absent
    /// sources give absent derived cells.
    pub fn derive_year_and_hour(table: &Table) -> Result<Table> {
        let years: Vec<Option<i64>> = table
            .column(schema::OCCUR_DATE)?
            .as_date(schema::OCCUR_DATE)?
            .iter()
            .map(|d| d.map(|d| i64::from(d.year())))
            .collect();
        let hours: Vec<Option<i64>> = table
            .column(schema::OCCUR_DATETIME)?
            .as_date_time(schema::OCCUR_DATETIME)?
            .iter()
            .map(|dt| dt.map(|dt| i64::from(dt.hour())))
            .collect();

        table
            .with_column(Column::new(schema::OCCUR_YEAR, ColumnData::Integer(years)))?
            .with_column(Column::new(schema::OCCUR_HOUR, ColumnData::Integer(hours)))
    }

    /// Partition rows by the tuple of values in `keys` and count each
    /// partition.
    ///
    /// Output is sorted by key. Only key tuples present in the data appear,
    /// each exactly once, and the counts sum to the table's row count. Absent
    /// cells group under [`Value::Missing`]; exclude them beforehand with
    /// [`crate::cleaner::drop_missing`] when a key must be present.
    pub fn count_by(table: &Table, keys: &[&str]) -> Result<Vec<GroupedCount>> {
        let columns: Vec<&ColumnData> = keys
            .iter()
            .map(|&k| table.column(k))
            .collect::<Result<_>>()?;

        let mut groups: BTreeMap<Vec<Value>, u64> = BTreeMap::new();
        for row in 0..table.row_count() {
            let key: Vec<Value> = columns.iter().map(|c| c.value(row)).collect();
            *groups.entry(key).or_insert(0) += 1;
        }

        debug!("count_by {:?}: {} groups", keys, groups.len());
        Ok(groups
            .into_iter()
            .map(|(key, count)| GroupedCount::new(key, count))
            .collect())
    }

    /// Per-borough murder share from counts grouped by (borough, murder flag).
    ///
    /// A borough with no `true` flag group gets `murder_count = 0`. Groups
    /// whose flag is neither `true` nor `false` count towards the total only.
    /// A missing borough forms its own row, never merged with any label.
    /// Sorted by borough, missing first.
    pub fn murder_rate_by_borough(counts: &[GroupedCount]) -> Result<Vec<MurderRate>> {
        let mut per_borough: BTreeMap<Option<String>, (u64, u64)> = BTreeMap::new();
        for group in counts {
            let [borough, flag] = group.key.as_slice() else {
                return Err(ReportError::KeyShape {
                    expected: 2,
                    actual: group.key.len(),
                });
            };
            let label = match borough {
                Value::Missing => None,
                other => Some(other.to_string()),
            };
            let entry = per_borough.entry(label).or_insert((0, 0));
            entry.0 += group.count;
            if flag.as_flag() == Some(true) {
                entry.1 += group.count;
            }
        }

        per_borough
            .into_iter()
            .map(|(borough, (total, murder_count))| -> Result<MurderRate> {
                let murder_percentage = percentage(murder_count, total)
                    .ok_or_else(|| {
                        ReportError::DivisionUndefined(
                            borough.clone().unwrap_or_else(|| Value::Missing.to_string()),
                        )
                    })?;
                Ok(MurderRate {
                    borough,
                    total,
                    murder_count,
                    murder_percentage,
                })
            })
            .collect()
    }

    /// Convert counts grouped by `OCCUR_HOUR` into `(hour, count)` points.
    ///
    /// The missing-hour group, if any, is skipped.
    pub fn hourly_counts(counts: &[GroupedCount]) -> Result<Vec<HourCount>> {
        let mut out = Vec::with_capacity(counts.len());
        for group in counts {
            let [hour] = group.key.as_slice() else {
                return Err(ReportError::KeyShape {
                    expected: 1,
                    actual: group.key.len(),
                });
            };
            match hour {
                Value::Missing => {
                    debug!("Skipping {} rows with no hour", group.count);
                }
                Value::Integer(h) if (0..=23).contains(h) => out.push(HourCount {
                    hour: *h as u32,
                    count: group.count,
                }),
                other => {
                    return Err(ReportError::ColumnType {
                        column: schema::OCCUR_HOUR.to_string(),
                        expected: "hour 0-23".to_string(),
                        actual: other.to_string(),
                    })
                }
            }
        }
        Ok(out)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
