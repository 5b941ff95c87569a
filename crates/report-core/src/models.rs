use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// One cell read out of a table, used as an element of a grouping key.
///
/// Categorical cells surface as [`Value::Text`] carrying their label.
/// `Missing` orders before every present value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// The text of a [`Value::Text`], `None` otherwise.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view: integers directly, text when it parses as one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret `"true"` / `"false"` (any case) as a boolean flag.
    pub fn as_flag(&self) -> Option<bool> {
        let text = self.as_text()?.trim();
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NA"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Date(d) => write!(f, "{}", d.format(crate::time_utils::DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A member of a categorical column's category set.
///
/// The absent cell is its own category and never equal to any label, even
/// one spelled `"UNKNOWN"` or `"NA"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Missing,
    Label(String),
}

/// Count of rows sharing one grouping-key tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedCount {
    /// One value per grouping column, in the order the columns were requested.
    pub key: Vec<Value>,
    pub count: u64,
}

impl GroupedCount {
    pub fn new(key: Vec<Value>, count: u64) -> Self {
        Self { key, count }
    }
}

/// Typed view of one row of the working table.
///
/// Fields are `None` when the cell is absent, the column is not in the table,
/// or the cell has not been coerced to the field's type yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Zero-based row index in the table the record was read from.
    pub row: usize,
    pub incident_key: Option<String>,
    pub occur_date: Option<NaiveDate>,
    pub occur_time: Option<String>,
    pub occur_datetime: Option<NaiveDateTime>,
    pub borough: Option<String>,
    pub precinct: Option<i64>,
    pub jurisdiction_code: Option<i64>,
    pub location_description: Option<String>,
    pub is_murder: Option<bool>,
}

/// Murder share of all incidents in one borough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MurderRate {
    /// `None` for incidents whose borough is missing.
    pub borough: Option<String>,
    pub total: u64,
    pub murder_count: u64,
    /// `murder_count / total * 100`, always within `[0, 100]`.
    pub murder_percentage: f64,
}

/// Incidents recorded in one hour of the day, summed over all days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: u64,
}

/// Observed and fitted incident counts for one hour of the trend window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub hour: u32,
    pub observed: u64,
    pub predicted: f64,
}

/// A cell that failed the date or date-time pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedTimestamp {
    pub row: usize,
    pub column: String,
    /// The raw text that failed to parse.
    pub value: String,
}

impl From<MalformedTimestamp> for ReportError {
    fn from(m: MalformedTimestamp) -> Self {
        ReportError::MalformedTimestamp {
            row: m.row,
            column: m.column,
            value: m.value,
        }
    }
}

/// A row excluded because a required column was absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRequiredField {
    pub row: usize,
    pub column: String,
}

impl From<MissingRequiredField> for ReportError {
    fn from(m: MissingRequiredField) -> Self {
        ReportError::MissingRequiredField {
            row: m.row,
            column: m.column,
        }
    }
}

/// Number of absent cells in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
    pub rows: usize,
}
