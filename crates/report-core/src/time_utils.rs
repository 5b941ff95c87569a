use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Month/day/4-digit-year, as published in `OCCUR_DATE`.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// `OCCUR_DATE` and `OCCUR_TIME` joined by a space. `%.f` makes the
/// fractional seconds optional.
pub const DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S%.f";

/// Parse an `OCCUR_DATE` cell.
///
/// Returns `None` for anything that is not a valid calendar date with a
/// four-digit year.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()?;
    has_four_digit_year(date.year()).then_some(date)
}

/// Parse the concatenation of an `OCCUR_DATE` and an `OCCUR_TIME` cell into
/// a single date-time (24-hour clock).
pub fn parse_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let joined = format!("{} {}", date.trim(), time.trim());
    let dt = NaiveDateTime::parse_from_str(&joined, DATETIME_FORMAT).ok()?;
    has_four_digit_year(dt.year()).then_some(dt)
}

/// Format a date back into the `OCCUR_DATE` pattern.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn has_four_digit_year(year: i32) -> bool {
    (1000..=9999).contains(&year)
}
