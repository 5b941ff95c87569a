use thiserror::Error;

/// All errors produced by the shooting-incident report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The CSV resource could not be fetched, read or parsed.
    #[error("Data unavailable from {source_name}: {reason}")]
    DataUnavailable { source_name: String, reason: String },

    /// A date or date-time cell did not match the expected pattern.
    #[error("Malformed timestamp in row {row}, column {column}: {value:?}")]
    MalformedTimestamp {
        row: usize,
        column: String,
        value: String,
    },

    /// A row lacks a value in a column the analysis requires.
    #[error("Missing required field {column} in row {row}")]
    MissingRequiredField { row: usize, column: String },

    /// A regression was requested with too few distinct predictor values.
    #[error("Insufficient data: need at least {required} distinct values, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A ratio was requested over a group with a zero denominator.
    #[error("Division undefined: group {0} has a total of zero")]
    DivisionUndefined(String),

    /// A column name is not present in the table.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A column holds a different type than the operation needs.
    #[error("Column {column} has type {actual}, expected {expected}")]
    ColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    /// Grouped counts were keyed by the wrong number of columns.
    #[error("Grouped key has {actual} columns, expected {expected}")]
    KeyShape { expected: usize, actual: usize },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The report could not be serialised.
    #[error("Failed to serialise report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the report crates.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_data_unavailable() {
        let err = ReportError::DataUnavailable {
            source_name: "https://example.org/rows.csv".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data unavailable from https://example.org/rows.csv: connection refused"
        );
    }

    #[test]
    fn test_error_display_malformed_timestamp() {
        let err = ReportError::MalformedTimestamp {
            row: 4,
            column: "OCCUR_DATE".to_string(),
            value: "13/45/2020".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed timestamp in row 4, column OCCUR_DATE: \"13/45/2020\""
        );
    }

    #[test]
    fn test_error_display_missing_required_field() {
        let err = ReportError::MissingRequiredField {
            row: 7,
            column: "JURISDICTION_CODE".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required field JURISDICTION_CODE in row 7"
        );
    }

    #[test]
    fn test_error_display_insufficient_data() {
        let err = ReportError::InsufficientData {
            required: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 2 distinct values, got 1"
        );
    }

    #[test]
    fn test_error_display_division_undefined() {
        let err = ReportError::DivisionUndefined("QUEENS".to_string());
        assert_eq!(
            err.to_string(),
            "Division undefined: group QUEENS has a total of zero"
        );
    }

    #[test]
    fn test_error_display_column_type() {
        let err = ReportError::ColumnType {
            column: "OCCUR_DATE".to_string(),
            expected: "date".to_string(),
            actual: "text".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Column OCCUR_DATE has type text, expected date"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ReportError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ReportError = json_err.into();
        assert!(err.to_string().contains("Failed to serialise report"));
    }
}
