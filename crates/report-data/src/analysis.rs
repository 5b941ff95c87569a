//! Main analysis pipeline for the shooting-incident report.
//!
//! Runs loading, cleaning, aggregation and the hourly trend fit in sequence,
//! returning a [`ReportResult`] of plain data for the presentation layer.

use std::ops::RangeInclusive;

use chrono::Utc;
use report_core::error::Result;
use report_core::models::{
    ColumnMissing, GroupedCount, HourCount, IncidentRecord, MalformedTimestamp,
    MissingRequiredField, MurderRate, TrendPoint,
};
use report_core::regression::LinearFit;
use report_core::schema;
use report_core::settings::Settings;
use report_core::table::Table;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::IncidentAggregator;
use crate::cleaner;
use crate::loader::load_table;

// ── Public types ──────────────────────────────────────────────────────────────

/// Inputs to a pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// URL or local path of the CSV.
    pub source: String,
    /// Hours included in the trend fit.
    pub trend_hours: RangeInclusive<u32>,
    /// Fail on the first malformed timestamp, or on a trend that cannot be
    /// fitted, instead of reporting it.
    pub strict: bool,
}

impl From<&Settings> for AnalysisOptions {
    fn from(s: &Settings) -> Self {
        Self {
            source: s.source.clone(),
            trend_hours: s.hour_range(),
            strict: s.strict,
        }
    }
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub source: String,
    /// Rows in the source file.
    pub rows_loaded: usize,
    /// Rows left after excluding those missing a required field.
    pub rows_retained: usize,
    /// Columns of the working table after cleaning.
    pub columns_retained: Vec<String>,
    /// Wall-clock seconds spent loading the CSV.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent cleaning, aggregating and fitting.
    pub transform_time_seconds: f64,
}

/// Data-quality side tables. Nothing listed here was corrected.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataQuality {
    pub malformed_timestamps: Vec<MalformedTimestamp>,
    /// Rows dropped for lacking a required field.
    pub excluded_rows: Vec<MissingRequiredField>,
    /// Rows without a jurisdiction code; left out of jurisdiction counts.
    pub missing_jurisdiction: Vec<IncidentRecord>,
    /// Absent cells per column before any row was excluded.
    pub missing_by_column: Vec<ColumnMissing>,
    /// Why no hourly trend was fitted, when none was.
    pub trend_unavailable: Option<String>,
}

/// Linear trend of incident count on hour of day.
#[derive(Debug, Clone, Serialize)]
pub struct HourlyTrend {
    pub first_hour: u32,
    pub last_hour: u32,
    pub fit: LinearFit,
    pub points: Vec<TrendPoint>,
}

impl HourlyTrend {
    /// Predicted count for `hour`. Only meaningful within
    /// `first_hour..=last_hour`.
    pub fn predict(&self, hour: u32) -> f64 {
        self.fit.predict(f64::from(hour))
    }
}

/// The complete output of [`analyze_incidents`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportResult {
    pub metadata: AnalysisMetadata,
    /// Keyed by `(OCCUR_YEAR)`.
    pub yearly: Vec<GroupedCount>,
    /// Keyed by `(BORO, OCCUR_YEAR)`.
    pub borough_yearly: Vec<GroupedCount>,
    pub murder_rates: Vec<MurderRate>,
    pub hourly: Vec<HourCount>,
    /// Keyed by `(JURISDICTION_CODE)`, rows without a code excluded.
    pub jurisdiction: Vec<GroupedCount>,
    /// Absent when the window holds fewer than two distinct hours.
    pub trend: Option<HourlyTrend>,
    pub data_quality: DataQuality,
}

impl ReportResult {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline.
///
/// 1. Load the CSV from `options.source`.
/// 2. Clean: drop demographic/location columns, parse timestamps, coerce
///    categoricals, exclude rows missing a required field.
/// 3. Aggregate counts by year, borough+year, borough+murder flag, hour and
///    jurisdiction.
/// 4. Fit the hourly trend over `options.trend_hours`. A window with fewer
///    than two distinct hours leaves `trend` empty unless `options.strict`.
pub fn analyze_incidents(options: &AnalysisOptions) -> Result<ReportResult> {
    let load_start = std::time::Instant::now();
    let raw = load_table(&options.source)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut result = analyze_table(&raw, options)?;
    result.metadata.load_time_seconds = load_time;
    Ok(result)
}

/// Run steps 2–4 of [`analyze_incidents`] on an already loaded table.
pub fn analyze_table(raw: &Table, options: &AnalysisOptions) -> Result<ReportResult> {
    let transform_start = std::time::Instant::now();

    // ── Clean ─────────────────────────────────────────────────────────────────
    let narrowed = cleaner::drop_demographic_and_location_columns(raw);
    let (typed, malformed) = cleaner::parse_datetime(&narrowed)?;
    if let Some(first) = malformed.first() {
        if options.strict {
            return Err(first.clone().into());
        }
        warn!(
            "{} malformed timestamps; rows without a date are excluded, rows without a time are left out of hourly counts",
            malformed.len()
        );
    }

    let categorical: Vec<&str> = schema::CATEGORICAL_COLUMNS
        .iter()
        .copied()
        .filter(|c| typed.has_column(c))
        .collect();
    let cleaned = cleaner::coerce_categoricals(&typed, &categorical)?;

    let missing_by_column = cleaner::missing_summary(&cleaned);
    let (retained, excluded_rows) = cleaner::drop_missing(&cleaned, schema::REQUIRED_COLUMNS)?;
    let missing_jurisdiction = cleaner::find_missing(&retained, schema::JURISDICTION_CODE)?;
    info!(
        "Cleaned table: {} of {} rows retained, {} without jurisdiction",
        retained.row_count(),
        raw.row_count(),
        missing_jurisdiction.len()
    );

    // ── Aggregate ─────────────────────────────────────────────────────────────
    let table = IncidentAggregator::derive_year_and_hour(&retained)?;

    let yearly = IncidentAggregator::count_by(&table, &[schema::OCCUR_YEAR])?;
    let borough_yearly = IncidentAggregator::count_by(&table, &[schema::BORO, schema::OCCUR_YEAR])?;
    let murder_counts =
        IncidentAggregator::count_by(&table, &[schema::BORO, schema::STATISTICAL_MURDER_FLAG])?;
    let murder_rates = IncidentAggregator::murder_rate_by_borough(&murder_counts)?;
    let hourly = IncidentAggregator::hourly_counts(&IncidentAggregator::count_by(
        &table,
        &[schema::OCCUR_HOUR],
    )?)?;

    let (with_jurisdiction, _) = cleaner::drop_missing(&table, &[schema::JURISDICTION_CODE])?;
    let jurisdiction = IncidentAggregator::count_by(&with_jurisdiction, &[schema::JURISDICTION_CODE])?;

    // ── Model ─────────────────────────────────────────────────────────────────
    let (trend, trend_unavailable) = match fit_hourly_trend(&hourly, options.trend_hours.clone()) {
        Ok(trend) => {
            debug!(
                "Hourly trend {}..={}: slope {:.3}, intercept {:.3}, r² {:.3}",
                trend.first_hour,
                trend.last_hour,
                trend.fit.slope,
                trend.fit.intercept,
                trend.fit.r_squared
            );
            (Some(trend), None)
        }
        Err(e) if options.strict => return Err(e),
        Err(e) => (None, Some(e.to_string())),
    };

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source: options.source.clone(),
        rows_loaded: raw.row_count(),
        rows_retained: table.row_count(),
        columns_retained: retained.column_names().iter().map(|c| c.to_string()).collect(),
        load_time_seconds: 0.0,
        transform_time_seconds: transform_start.elapsed().as_secs_f64(),
    };

    Ok(ReportResult {
        metadata,
        yearly,
        borough_yearly,
        murder_rates,
        hourly,
        jurisdiction,
        trend,
        data_quality: DataQuality {
            malformed_timestamps: malformed,
            excluded_rows,
            missing_jurisdiction,
            missing_by_column,
            trend_unavailable,
        },
    })
}

/// Fit count against hour for the hours in `hours`.
///
/// Hours with no observations are not filled with zeros. Fails with
/// [`report_core::error::ReportError::InsufficientData`] when fewer than two hours remain.
pub fn fit_hourly_trend(counts: &[HourCount], hours: RangeInclusive<u32>) -> Result<HourlyTrend> {
    let window: Vec<HourCount> = counts
        .iter()
        .filter(|c| hours.contains(&c.hour))
        .copied()
        .collect();
    let xy: Vec<(f64, f64)> = window
        .iter()
        .map(|c| (f64::from(c.hour), c.count as f64))
        .collect();

    let fit = match LinearFit::fit(&xy) {
        Ok(fit) => fit,
        Err(e) => {
            warn!("No trend fitted over hours {}..={}: {}", hours.start(), hours.end(), e);
            return Err(e);
        }
    };

    let points = window
        .iter()
        .map(|c| TrendPoint {
            hour: c.hour,
            observed: c.count,
            predicted: fit.predict(f64::from(c.hour)),
        })
        .collect();

    Ok(HourlyTrend {
        first_hour: *hours.start(),
        last_hour: *hours.end(),
        fit,
        points,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::error::ReportError;
    use report_core::models::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "INCIDENT_KEY,OCCUR_DATE,OCCUR_TIME,BORO,PRECINCT,JURISDICTION_CODE,LOCATION_DESC,STATISTICAL_MURDER_FLAG,PERP_AGE_GROUP,PERP_SEX,PERP_RACE,VIC_AGE_GROUP,VIC_SEX,VIC_RACE,X_COORD_CD,Y_COORD_CD,Latitude,Longitude,Lon_Lat";

    /// Hours 9..=13 get 1..=5 incidents respectively, plus one row with an
    /// impossible date and one early-morning row without a jurisdiction.
    fn fixture_csv() -> String {
        let mut lines = vec![HEADER.to_string()];
        let mut key = 0;
        for (i, hour) in (9..=13).enumerate() {
            for n in 0..=i {
                key += 1;
                let boro = if n % 2 == 0 { "BRONX" } else { "QUEENS" };
                let flag = if key % 4 == 0 { "true" } else { "false" };
                let year = if hour < 11 { 2019 } else { 2020 };
                lines.push(format!(
                    "{key},03/0{d}/{year},{hour}:15:00,{boro},44,0,,{flag},,,,25-44,M,BLACK,1,2,40.8,-73.9,POINT (-73.9 40.8)",
                    d = 1 + n % 9
                ));
            }
        }
        lines.push(
            "900,02/30/2020,10:00:00,BRONX,44,0,,false,,,,25-44,M,BLACK,1,2,40.8,-73.9,POINT (-73.9 40.8)"
                .to_string(),
        );
        lines.push(
            "901,03/01/2020,04:00:00,QUEENS,113,,,true,,,,25-44,M,BLACK,1,2,40.8,-73.9,POINT (-73.9 40.8)"
                .to_string(),
        );
        lines.join("\n") + "\n"
    }

    fn options(source: &str) -> AnalysisOptions {
        AnalysisOptions {
            source: source.to_string(),
            trend_hours: 9..=23,
            strict: false,
        }
    }

    fn run() -> ReportResult {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(fixture_csv().as_bytes()).expect("write");
        analyze_incidents(&options(file.path().to_str().unwrap())).expect("pipeline")
    }

    #[test]
    fn test_pipeline_row_accounting() {
        let result = run();
        assert_eq!(result.metadata.rows_loaded, 17);
        // The invalid 02/30 date is excluded.
        assert_eq!(result.metadata.rows_retained, 16);
        assert_eq!(result.data_quality.malformed_timestamps.len(), 1);
        assert_eq!(result.data_quality.excluded_rows.len(), 1);
        let yearly_total: u64 = result.yearly.iter().map(|g| g.count).sum();
        assert_eq!(yearly_total, 16);
    }

    #[test]
    fn test_pipeline_drops_demographics() {
        let result = run();
        let columns = &result.metadata.columns_retained;
        assert!(!columns.iter().any(|c| c.starts_with("PERP_") || c.starts_with("VIC_")));
        assert!(!columns.iter().any(|c| c == "Latitude" || c == "Lon_Lat"));
        assert!(columns.iter().any(|c| c == schema::OCCUR_DATETIME));
    }

    #[test]
    fn test_pipeline_jurisdiction_exclusion() {
        let result = run();
        assert_eq!(result.data_quality.missing_jurisdiction.len(), 1);
        assert_eq!(
            result.data_quality.missing_jurisdiction[0].incident_key.as_deref(),
            Some("901")
        );
        assert_eq!(
            result.jurisdiction,
            vec![GroupedCount::new(vec![Value::Text("0".to_string())], 15)]
        );
    }

    #[test]
    fn test_pipeline_murder_rates_bounded() {
        let result = run();
        assert_eq!(result.murder_rates.len(), 2);
        for rate in &result.murder_rates {
            assert!(rate.murder_count <= rate.total);
            assert!((0.0..=100.0).contains(&rate.murder_percentage));
        }
        let total: u64 = result.murder_rates.iter().map(|r| r.total).sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn test_pipeline_trend_excludes_early_hours() {
        let result = run();
        // Hour 4 is outside the default window.
        assert!(result.hourly.iter().any(|h| h.hour == 4));
        let trend = result.trend.as_ref().expect("trend");
        assert!(trend.points.iter().all(|p| p.hour >= 9));
        assert_eq!(trend.points.len(), 5);
        assert!((trend.fit.slope - 1.0).abs() < 1e-9);
        assert!((trend.predict(9) - 1.0).abs() < 1e-9);
        assert!((trend.fit.r_squared - 1.0).abs() < 1e-9);
        assert!(result.data_quality.trend_unavailable.is_none());
    }

    const NARROW_HEADER: &str = "INCIDENT_KEY,OCCUR_DATE,OCCUR_TIME,BORO,PRECINCT,JURISDICTION_CODE,LOCATION_DESC,STATISTICAL_MURDER_FLAG";

    fn night_table() -> Table {
        let csv = format!(
            "{NARROW_HEADER}\n\
1,01/01/2020,02:10:00,BRONX,44,0,,true\n\
2,01/02/2020,03:10:00,BRONX,44,0,,false\n\
3,01/03/2021,04:20:00,QUEENS,113,1,,false\n"
        );
        crate::loader::parse_csv(csv.as_bytes(), "fixture").unwrap()
    }

    #[test]
    fn test_pipeline_keeps_aggregates_without_trend() {
        let result = analyze_table(&night_table(), &options("fixture")).unwrap();

        assert!(result.trend.is_none());
        assert!(result
            .data_quality
            .trend_unavailable
            .as_deref()
            .is_some_and(|reason| reason.contains("Insufficient data")));
        assert_eq!(result.yearly.iter().map(|g| g.count).sum::<u64>(), 3);
        assert_eq!(result.borough_yearly.len(), 2);
        assert_eq!(result.murder_rates.len(), 2);
        assert_eq!(result.hourly.len(), 3);
        assert_eq!(result.jurisdiction.len(), 2);
    }

    #[test]
    fn test_pipeline_bad_time_kept_out_of_hourly_only() {
        let csv = format!(
            "{NARROW_HEADER}\n\
1,01/01/2020,09:10:00,BRONX,44,0,,true\n\
2,01/02/2020,25:99:00,BRONX,44,0,,false\n\
3,01/03/2020,10:20:00,QUEENS,113,0,,false\n"
        );
        let table = crate::loader::parse_csv(csv.as_bytes(), "fixture").unwrap();
        let result = analyze_table(&table, &options("fixture")).unwrap();

        assert_eq!(result.data_quality.malformed_timestamps.len(), 1);
        assert_eq!(result.data_quality.malformed_timestamps[0].column, schema::OCCUR_TIME);
        assert_eq!(result.metadata.rows_retained, 3);
        assert_eq!(result.yearly.iter().map(|g| g.count).sum::<u64>(), 3);
        assert_eq!(result.hourly.iter().map(|h| h.count).sum::<u64>(), 2);
    }

    #[test]
    fn test_pipeline_strict_fails_without_trend() {
        let mut opts = options("fixture");
        opts.strict = true;
        let err = analyze_table(&night_table(), &opts).unwrap_err();
        assert!(matches!(err, ReportError::InsufficientData { required: 2, actual: 0 }));
    }

    #[test]
    fn test_pipeline_strict_fails_on_malformed() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(fixture_csv().as_bytes()).expect("write");
        let mut opts = options(file.path().to_str().unwrap());
        opts.strict = true;
        let err = analyze_incidents(&opts).unwrap_err();
        assert!(matches!(err, ReportError::MalformedTimestamp { .. }));
    }

    #[test]
    fn test_pipeline_unavailable_source() {
        let err = analyze_incidents(&options("/no/such/dir/rows.csv")).unwrap_err();
        assert!(matches!(err, ReportError::DataUnavailable { .. }));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let json = run().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["trend"]["fit"]["slope"].is_number());
        assert_eq!(value["yearly"][0]["key"][0], 2019);
        assert!(value["data_quality"]["missing_by_column"].is_array());
    }

    // ── fit_hourly_trend ─────────────────────────────────────────────────────

    #[test]
    fn test_fit_hourly_trend_scenario() {
        let counts: Vec<HourCount> = (9..=13)
            .zip([10, 20, 30, 40, 50])
            .map(|(hour, count)| HourCount { hour, count })
            .collect();
        let trend = fit_hourly_trend(&counts, 9..=23).unwrap();
        assert!((trend.fit.slope - 10.0).abs() < 1e-9);
        assert!((trend.predict(9) - 10.0).abs() < 1e-9);
        assert!((trend.fit.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(trend.points[4].observed, 50);
        assert!((trend.points[4].predicted - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_hourly_trend_single_hour_in_window() {
        let counts = vec![
            HourCount { hour: 3, count: 40 },
            HourCount { hour: 5, count: 30 },
            HourCount { hour: 20, count: 90 },
        ];
        let err = fit_hourly_trend(&counts, 9..=23).unwrap_err();
        assert!(matches!(err, ReportError::InsufficientData { actual: 1, .. }));
    }
}
