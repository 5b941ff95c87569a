//! Columnar in-memory table.
//!
//! Every column is a typed sequence of optional cells. An absent cell is an
//! explicit `None`; blank text never stands in for "no value".

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ReportError, Result};
use crate::models::{Category, IncidentRecord, Value};
use crate::schema;

// ── LabelSet ──────────────────────────────────────────────────────────────────

/// Dynamic enumeration mapping label strings to dense integer codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
    index: HashMap<String, u32>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the code for `label`, adding it to the set if unseen.
    pub fn intern(&mut self, label: &str) -> u32 {
        if let Some(&code) = self.index.get(label) {
            return code;
        }
        let code = self.labels.len() as u32;
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), code);
        code
    }

    pub fn code(&self, label: &str) -> Option<u32> {
        self.index.get(label).copied()
    }

    pub fn label(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }

    /// Labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// ── Categorical ───────────────────────────────────────────────────────────────

/// A column of category codes backed by a [`LabelSet`].
///
/// `None` codes are the distinguished missing category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categorical {
    levels: LabelSet,
    codes: Vec<Option<u32>>,
}

impl Categorical {
    /// Build from raw labels. Levels are interned in sorted order so codes
    /// are stable for a given set of observed values.
    pub fn from_labels<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let cells: Vec<Option<S>> = values.into_iter().collect();
        let distinct: BTreeSet<&str> = cells.iter().flatten().map(|s| s.as_ref()).collect();

        let mut levels = LabelSet::new();
        for label in distinct {
            levels.intern(label);
        }
        let codes = cells
            .iter()
            .map(|cell| cell.as_ref().and_then(|s| levels.code(s.as_ref())))
            .collect();

        Self { levels, codes }
    }

    /// Append one cell, interning its label if it has not been seen.
    pub fn push(&mut self, value: Option<&str>) {
        let code = value.map(|label| self.levels.intern(label));
        self.codes.push(code);
    }

    pub fn levels(&self) -> &LabelSet {
        &self.levels
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .copied()
            .flatten()
            .and_then(|code| self.levels.label(code))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn has_missing(&self) -> bool {
        self.codes.iter().any(Option::is_none)
    }

    /// Categories present in the column: every label in use plus
    /// [`Category::Missing`] when any cell is absent.
    pub fn categories(&self) -> Vec<Category> {
        let used: BTreeSet<u32> = self.codes.iter().flatten().copied().collect();
        let mut out: Vec<Category> = used
            .into_iter()
            .filter_map(|code| self.levels.label(code))
            .map(|label| Category::Label(label.to_string()))
            .collect();
        if self.has_missing() {
            out.insert(0, Category::Missing);
        }
        out
    }

    /// Number of distinct categories present, counting the missing category.
    pub fn cardinality(&self) -> usize {
        self.categories().len()
    }

    fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            levels: self.levels.clone(),
            codes: rows.iter().map(|&r| self.codes[r]).collect(),
        }
    }
}

// ── ColumnData ────────────────────────────────────────────────────────────────

/// The element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Date,
    DateTime,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Date => "date",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Categorical => "categorical",
        };
        f.write_str(name)
    }
}

/// A typed sequence of optional cells.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Integer(Vec<Option<i64>>),
    Date(Vec<Option<NaiveDate>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    Categorical(Categorical),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Integer(v) => v.len(),
            ColumnData::Date(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
            ColumnData::Categorical(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Integer(_) => ColumnKind::Integer,
            ColumnData::Date(_) => ColumnKind::Date,
            ColumnData::DateTime(_) => ColumnKind::DateTime,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
        }
    }

    /// Cell at `row` as a grouping [`Value`]. Out-of-range rows read as missing.
    pub fn value(&self, row: usize) -> Value {
        let value = match self {
            ColumnData::Text(v) => v.get(row).cloned().flatten().map(Value::Text),
            ColumnData::Integer(v) => v.get(row).copied().flatten().map(Value::Integer),
            ColumnData::Date(v) => v.get(row).copied().flatten().map(Value::Date),
            ColumnData::DateTime(v) => v.get(row).copied().flatten().map(Value::DateTime),
            ColumnData::Categorical(c) => c.get(row).map(|s| Value::Text(s.to_string())),
        };
        value.unwrap_or(Value::Missing)
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Text(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Integer(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Date(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::DateTime(v) => v.get(row).map_or(true, Option::is_none),
            ColumnData::Categorical(c) => c.get(row).is_none(),
        }
    }

    /// Text cells; `ColumnType` error for any other kind.
    pub fn as_text(&self, column: &str) -> Result<&[Option<String>]> {
        match self {
            ColumnData::Text(v) => Ok(v),
            other => Err(type_error(column, ColumnKind::Text, other.kind())),
        }
    }

    pub fn as_date(&self, column: &str) -> Result<&[Option<NaiveDate>]> {
        match self {
            ColumnData::Date(v) => Ok(v),
            other => Err(type_error(column, ColumnKind::Date, other.kind())),
        }
    }

    pub fn as_date_time(&self, column: &str) -> Result<&[Option<NaiveDateTime>]> {
        match self {
            ColumnData::DateTime(v) => Ok(v),
            other => Err(type_error(column, ColumnKind::DateTime, other.kind())),
        }
    }

    fn take_rows(&self, rows: &[usize]) -> Self {
        match self {
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&r| v[r].clone()).collect()),
            ColumnData::Integer(v) => ColumnData::Integer(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Date(v) => ColumnData::Date(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::DateTime(v) => ColumnData::DateTime(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Categorical(c) => ColumnData::Categorical(c.take_rows(rows)),
        }
    }
}

fn type_error(column: &str, expected: ColumnKind, actual: ColumnKind) -> ReportError {
    ReportError::ColumnType {
        column: column.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

// ── Column / Table ────────────────────────────────────────────────────────────

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Ordered set of equally long named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table, checking that all columns have the same length and
    /// unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, |c| c.data.len());
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.data.len() != rows {
                return Err(anyhow::anyhow!(
                    "column {} has {} rows, expected {}",
                    column.name,
                    column.data.len(),
                    rows
                )
                .into());
            }
            if !seen.insert(column.name.as_str()) {
                return Err(anyhow::anyhow!("duplicate column {}", column.name).into());
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.data)
            .ok_or_else(|| ReportError::UnknownColumn(name.to_string()))
    }

    /// A copy of the table with `column` replacing the same-named column in
    /// place, or appended when the name is new.
    pub fn with_column(&self, column: Column) -> Result<Table> {
        if (!self.columns.is_empty() || self.rows > 0) && column.data.len() != self.rows {
            return Err(anyhow::anyhow!(
                "column {} has {} rows, expected {}",
                column.name,
                column.data.len(),
                self.rows
            )
            .into());
        }
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => columns.push(column),
        }
        Table::new(columns)
    }

    /// A copy of the table without the named columns. Names not present are
    /// ignored. The row count is kept even when no column remains.
    pub fn without_columns(&self, names: &[&str]) -> Table {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .filter(|c| !names.contains(&c.name.as_str()))
            .cloned()
            .collect();
        Table {
            columns,
            rows: self.rows,
        }
    }

    /// A copy holding only `rows`, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take_rows(rows)))
                .collect(),
            rows: rows.len(),
        }
    }

    /// Typed view of `row`. Columns the table lacks leave their field `None`.
    pub fn record(&self, row: usize) -> IncidentRecord {
        let value = |name: &str| {
            self.column(name)
                .map(|c| c.value(row))
                .unwrap_or(Value::Missing)
        };
        let text = |name: &str| match value(name) {
            Value::Missing => None,
            other => Some(other.to_string()),
        };

        IncidentRecord {
            row,
            incident_key: text(schema::INCIDENT_KEY),
            occur_date: match value(schema::OCCUR_DATE) {
                Value::Date(d) => Some(d),
                _ => None,
            },
            occur_time: text(schema::OCCUR_TIME),
            occur_datetime: match value(schema::OCCUR_DATETIME) {
                Value::DateTime(dt) => Some(dt),
                _ => None,
            },
            borough: text(schema::BORO),
            precinct: value(schema::PRECINCT).as_integer(),
            jurisdiction_code: value(schema::JURISDICTION_CODE).as_integer(),
            location_description: text(schema::LOCATION_DESC),
            is_murder: value(schema::STATISTICAL_MURDER_FLAG).as_flag(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[Option<&str>]) -> ColumnData {
        ColumnData::Text(values.iter().map(|v| v.map(String::from)).collect())
    }

    #[test]
    fn test_label_set_intern_is_stable() {
        let mut set = LabelSet::new();
        let a = set.intern("BRONX");
        let b = set.intern("QUEENS");
        assert_eq!(set.intern("BRONX"), a);
        assert_ne!(a, b);
        assert_eq!(set.label(b), Some("QUEENS"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_categorical_cardinality_counts_missing_separately() {
        let cat = Categorical::from_labels(vec![
            Some("UNKNOWN"),
            None,
            Some("MULTI DWELL - PUBLIC HOUS"),
            Some("UNKNOWN"),
        ]);
        assert_eq!(cat.levels().len(), 2);
        assert_eq!(cat.cardinality(), 3);
        assert!(cat.categories().contains(&Category::Missing));
        assert!(cat
            .categories()
            .contains(&Category::Label("UNKNOWN".to_string())));
    }

    #[test]
    fn test_categorical_push_admits_unseen_label() {
        let mut cat = Categorical::from_labels(vec![Some("BRONX"), Some("QUEENS")]);
        cat.push(Some("STATEN ISLAND"));
        cat.push(None);
        assert_eq!(cat.len(), 4);
        assert_eq!(cat.get(2), Some("STATEN ISLAND"));
        assert_eq!(cat.get(3), None);
        assert_eq!(cat.cardinality(), 4);
    }

    #[test]
    fn test_categorical_levels_sorted() {
        let cat = Categorical::from_labels(vec![Some("QUEENS"), Some("BRONX"), Some("QUEENS")]);
        assert_eq!(cat.levels().labels(), &["BRONX", "QUEENS"]);
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::new("A", text(&[Some("1"), Some("2")])),
            Column::new("B", text(&[Some("1")])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_table_unknown_column() {
        let table = Table::new(vec![Column::new("A", text(&[Some("1")]))]).unwrap();
        assert!(matches!(
            table.column("B"),
            Err(ReportError::UnknownColumn(name)) if name == "B"
        ));
    }

    #[test]
    fn test_with_column_replaces_in_place() {
        let table = Table::new(vec![
            Column::new("A", text(&[Some("1")])),
            Column::new("B", text(&[Some("x")])),
        ])
        .unwrap();
        let replaced = table
            .with_column(Column::new("A", ColumnData::Integer(vec![Some(1)])))
            .unwrap();
        assert_eq!(replaced.column_names(), vec!["A", "B"]);
        assert_eq!(replaced.column("A").unwrap().kind(), ColumnKind::Integer);
        // Original untouched.
        assert_eq!(table.column("A").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn test_without_columns_keeps_rows_when_all_dropped() {
        let table = Table::new(vec![
            Column::new("A", text(&[Some("1"), None])),
            Column::new("B", text(&[Some("x"), Some("y")])),
        ])
        .unwrap();
        let empty = table.without_columns(&["A", "B"]);
        assert_eq!(empty.column_count(), 0);
        assert_eq!(empty.row_count(), 2);

        assert!(empty
            .with_column(Column::new("C", text(&[Some("z")])))
            .is_err());
        let refilled = empty
            .with_column(Column::new("C", text(&[Some("z"), None])))
            .unwrap();
        assert_eq!(refilled.row_count(), 2);
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let table = Table::new(vec![Column::new(
            "A",
            text(&[Some("a"), Some("b"), Some("c")]),
        )])
        .unwrap();
        let picked = table.select_rows(&[2, 0]);
        assert_eq!(picked.row_count(), 2);
        assert_eq!(picked.column("A").unwrap().value(0), Value::Text("c".into()));
        assert_eq!(picked.column("A").unwrap().value(1), Value::Text("a".into()));
    }

    #[test]
    fn test_record_reads_typed_fields() {
        let table = Table::new(vec![
            Column::new(schema::INCIDENT_KEY, text(&[Some("236168668")])),
            Column::new(
                schema::OCCUR_DATE,
                ColumnData::Date(vec![NaiveDate::from_ymd_opt(2021, 11, 11)]),
            ),
            Column::new(schema::OCCUR_TIME, text(&[Some("15:04:00")])),
            Column::new(schema::BORO, text(&[Some("BROOKLYN")])),
            Column::new(schema::PRECINCT, text(&[Some("79")])),
            Column::new(schema::JURISDICTION_CODE, text(&[None])),
            Column::new(
                schema::STATISTICAL_MURDER_FLAG,
                ColumnData::Categorical(Categorical::from_labels(vec![Some("false")])),
            ),
        ])
        .unwrap();

        let record = table.record(0);
        assert_eq!(record.incident_key.as_deref(), Some("236168668"));
        assert_eq!(record.occur_date, NaiveDate::from_ymd_opt(2021, 11, 11));
        assert_eq!(record.borough.as_deref(), Some("BROOKLYN"));
        assert_eq!(record.precinct, Some(79));
        assert_eq!(record.jurisdiction_code, None);
        assert_eq!(record.is_murder, Some(false));
        assert_eq!(record.location_description, None);
    }
}
